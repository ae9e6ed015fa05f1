//! Rendering hook.
//!
//! The sync core only tracks each sensor's `redraw_pending` flag; actual
//! drawing and widget construction are delegated to a collaborator behind
//! this trait.

use crate::sensor::Sensor;

pub trait Renderer {
    /// Builds whatever UI the sensor needs, once.
    fn construct(&mut self, sensor: &Sensor);

    /// Repaints the sensor.
    fn draw(&mut self, sensor: &Sensor);
}

/// Renderer that does nothing. The default collaborator for headless use.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn construct(&mut self, _sensor: &Sensor) {}

    fn draw(&mut self, _sensor: &Sensor) {}
}
