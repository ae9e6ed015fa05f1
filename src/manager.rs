//! Owns the sensor collection and drives its lifecycle: discovery,
//! configuration push, value pull, redraw signalling and teardown.
//!
//! The manager is the error boundary: sensor-level failures during batch
//! operations are caught here and recorded on the failing sensor's own
//! error/status fields, never propagated. One bad sensor must not block the
//! rest of the batch.

use log::{error, info, warn};

use crate::codec;
use crate::error::TwinError;
use crate::factory::SensorFactory;
use crate::parser;
use crate::render::Renderer;
use crate::sensor::Sensor;
use crate::transport::Transport;

pub struct SensorManager<T: Transport, R: Renderer> {
    sensors: Vec<Sensor>,
    factory: SensorFactory,
    transport: T,
    renderer: R,
}

impl<T: Transport, R: Renderer> SensorManager<T, R> {
    /// Manager over the given collaborators, with the built-in sensor kinds
    /// registered. The collection starts empty; call [`initialize`].
    ///
    /// [`initialize`]: SensorManager::initialize
    pub fn new(transport: T, renderer: R) -> Self {
        Self {
            sensors: Vec::new(),
            factory: SensorFactory::with_builtin(),
            transport,
            renderer,
        }
    }

    /// Registry access, e.g. to register additional sensor kinds before
    /// discovery.
    pub fn factory_mut(&mut self) -> &mut SensorFactory {
        &mut self.factory
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Populates the collection, either from the fixed built-in list or by
    /// asking the device which sensors exist. Any discovery problem falls
    /// back to the built-in list; the manager never ends up initialized but
    /// empty.
    pub fn initialize(&mut self, from_discovery: bool) {
        info!("initializing sensor manager (discovery: {from_discovery})");
        self.sensors.clear();

        if from_discovery {
            match self.discover() {
                Ok(sensors) if !sensors.is_empty() => {
                    info!("discovery yielded {} sensor(s)", sensors.len());
                    self.sensors = sensors;
                    return;
                }
                Ok(_) => warn!("discovery yielded no usable sensors, using built-in list"),
                Err(e) => warn!("discovery failed ({e}), using built-in list"),
            }
        }

        self.sensors = SensorFactory::builtin_list();
    }

    fn discover(&mut self) -> Result<Vec<Sensor>, TwinError> {
        self.transport.send(&format!("{}INIT", codec::MARKER))?;
        let response = self.transport.receive()?;
        if !response.starts_with(codec::MARKER) {
            return Err(TwinError::format(format!(
                "discovery response missing marker: {response:?}"
            )));
        }
        Ok(self.factory.from_discovery(&response))
    }

    /// First sensor with the given uid. Duplicate uids may exist in the
    /// collection; lookup returns the first match.
    pub fn find(&self, uid: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.uid == uid)
    }

    pub fn find_mut(&mut self, uid: &str) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|s| s.uid == uid)
    }

    pub fn add(&mut self, sensor: Sensor) {
        self.sensors.push(sensor);
    }

    /// Applies one inbound update request to the sensor it addresses.
    ///
    /// Malformed requests and unknown uids are logged and dropped; a failing
    /// update is recorded on the target sensor. Nothing propagates.
    pub fn dispatch(&mut self, request: &str) {
        let metadata = match parser::parse_request(request) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("ignoring request: {e}");
                return;
            }
        };
        if !parser::check_metadata(&metadata) {
            warn!("ignoring request without id or payload: {request:?}");
            return;
        }
        let Some(sensor) = self.sensors.iter_mut().find(|s| s.uid == metadata.uid) else {
            warn!("no sensor with uid {:?}, request dropped", metadata.uid);
            return;
        };
        if let Err(e) = sensor.apply_update_str(&metadata.payload) {
            error!("sensor {}: update failed: {e}", sensor.uid);
            sensor.set_error(Some(e));
        }
    }

    /// Synchronizes one sensor by uid. Unknown uids are ignored.
    pub fn sync(&mut self, uid: &str) {
        let transport = &mut self.transport;
        if let Some(sensor) = self.sensors.iter_mut().find(|s| s.uid == uid) {
            if let Err(e) = sensor.synchronize(transport) {
                error!("sensor {}: synchronization failed: {e}", sensor.uid);
                sensor.set_error(Some(e));
            }
        }
    }

    /// Synchronizes every sensor in collection order. A failure is recorded
    /// on the failing sensor and the batch continues.
    pub fn resync_all(&mut self) {
        let transport = &mut self.transport;
        for sensor in &mut self.sensors {
            if let Err(e) = sensor.synchronize(transport) {
                error!("sensor {}: synchronization failed: {e}", sensor.uid);
                sensor.set_error(Some(e));
            }
        }
    }

    pub fn print(&self, uid: &str) {
        if let Some(sensor) = self.find(uid) {
            sensor.print();
        }
    }

    pub fn print_all(&self) {
        for sensor in &self.sensors {
            sensor.print();
        }
    }

    /// Repaints every sensor with a pending redraw.
    pub fn redraw_all(&mut self) {
        for sensor in &mut self.sensors {
            sensor.draw(&mut self.renderer);
        }
    }

    /// Rebuilds the UI of every sensor through the renderer hook.
    pub fn reconstruct_all(&mut self) {
        for sensor in &self.sensors {
            self.renderer.construct(sensor);
        }
    }

    /// Destroys every sensor (releasing any chained error it holds) and
    /// empties the collection.
    pub fn erase_all(&mut self) {
        info!("erasing {} sensor(s)", self.sensors.len());
        self.sensors.clear();
    }
}
