//! Driver handle contract for a Talon SRX style CAN motor controller.
//!
//! The CAN traffic itself lives behind this trait; this crate only consumes
//! the handle and never speaks on the bus.

use defmt::Format;
use fugit::MillisDurationU32;

/// How a commanded output value is interpreted by the controller
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Format)]
pub enum ControlMode {
    /// Output is a fraction of maximum output magnitude
    #[default]
    PercentOutput,
    /// Closed loop on sensor position
    Position,
    /// Closed loop on sensor velocity
    Velocity,
    /// Closed loop on output current
    Current,
    /// Output stage disabled
    Disabled,
}

/// Behavior of the output stage when commanded to neutral
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Format)]
pub enum NeutralMode {
    /// Windings are left open, the motor spins down freely
    #[default]
    Coast,
    /// Windings are shorted, the motor brakes actively
    Brake,
}

/// Sensor source reporting position and velocity for closed loop control
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Format)]
pub enum FeedbackDevice {
    /// Quadrature encoder on the data port
    #[default]
    QuadEncoder,
    /// Analog potentiometer or continuous analog sensor
    Analog,
    /// Tachometer input
    Tachometer,
    /// Pulse width encoded absolute position
    PulseWidth,
}

/// A bound handle to one motor controller on the CAN bus.
///
/// Configuration calls carry a timeout after which the driver gives up on the
/// device acknowledging the register write. Failures are the implementor's
/// own error type and pass through the adapter unmodified.
pub trait TalonSrx {
    type Error;

    /// Command an output value interpreted in the given mode
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn set(&mut self, mode: ControlMode, output: f64) -> Result<(), Self::Error>;

    /// Command the output stage to neutral
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn neutral_output(&mut self) -> Result<(), Self::Error>;

    /// Select brake or coast behavior for neutral output
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn set_neutral_mode(&mut self, mode: NeutralMode) -> Result<(), Self::Error>;

    /// Whether the output direction is inverted
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    fn inverted(&self) -> Result<bool, Self::Error>;

    /// Invert the output direction
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn set_inverted(&mut self, inverted: bool) -> Result<(), Self::Error>;

    /// Invert the reported sensor direction
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn set_sensor_phase(&mut self, reversed: bool) -> Result<(), Self::Error>;

    /// Select the sensor source for a closed loop slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_selected_feedback_sensor(
        &mut self,
        device: FeedbackDevice,
        pid_idx: u8,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the proportional gain of a profile slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_kp(
        &mut self,
        slot: u8,
        gain: f64,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the integral gain of a profile slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_ki(
        &mut self,
        slot: u8,
        gain: f64,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the derivative gain of a profile slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_kd(
        &mut self,
        slot: u8,
        gain: f64,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the feed forward gain of a profile slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_kf(
        &mut self,
        slot: u8,
        gain: f64,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the integral accumulation zone of a profile slot, in raw sensor
    /// units
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_integral_zone(
        &mut self,
        slot: u8,
        integral_zone: i32,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Set the closed loop ramp, in seconds from neutral to full output
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    fn config_closed_loop_ramp(
        &mut self,
        seconds_from_neutral_to_full: f64,
        timeout: MillisDurationU32,
    ) -> Result<(), Self::Error>;

    /// Make a profile slot the active gain set for a closed loop slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the command can't be delivered
    /// to the device.
    fn select_profile_slot(&mut self, slot: u8, pid_idx: u8) -> Result<(), Self::Error>;

    /// Position of the selected sensor in raw sensor units
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    fn selected_sensor_position(&mut self, pid_idx: u8) -> Result<i32, Self::Error>;

    /// Velocity of the selected sensor in raw sensor units per 100 ms
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    fn selected_sensor_velocity(&mut self, pid_idx: u8) -> Result<i32, Self::Error>;

    /// Output current reported by the device, in amperes
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    fn output_current(&mut self) -> Result<f64, Self::Error>;

    /// Clear sticky fault flags latched on the device
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// within the timeout.
    fn clear_sticky_faults(&mut self, timeout: MillisDurationU32) -> Result<(), Self::Error>;

    /// Display name stored on the handle, if one has been assigned
    fn name(&self) -> Option<&str>;

    /// Assign the display name
    fn set_name(&mut self, name: &str);

    /// Subsystem label stored on the handle, if one has been assigned
    fn subsystem(&self) -> Option<&str>;

    /// Assign the subsystem label
    fn set_subsystem(&mut self, subsystem: &str);
}
