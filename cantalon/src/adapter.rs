//! Compatibility wrapper presenting a [`TalonSrx`] handle through the legacy
//! speed controller and dashboard contracts.

use core::fmt;
use core::hash::{Hash, Hasher};

#[cfg(not(test))]
use defmt::debug;
use fugit::MillisDurationU32;
#[cfg(test)]
use log::debug;

use speedcontroller::{Sendable, SendableBuilder, SpeedController};

use crate::talon::{ControlMode, FeedbackDevice, NeutralMode, TalonSrx};

/// Timeout passed to every configuration call on the driver handle
pub const CONFIG_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(100);

/// Widget type tag reported to the dashboard
pub const SMART_DASHBOARD_TYPE: &str = "Speed Controller";

/// Wrapper around a [`TalonSrx`] handle replicating the legacy speed
/// controller API.
///
/// The handle is owned exclusively for the lifetime of the wrapper. Commanded
/// speed, control mode and the encoder multiplier are tracked locally; all
/// hardware effects are delegated.
#[derive(Debug)]
pub struct CanTalon<T> {
    talon: T,
    device_number: u8,
    control_mode: ControlMode,
    current_speed: f64,
    encoder_multiplier: i32,
    pid_idx: u8,
}

impl<T: TalonSrx> CanTalon<T> {
    /// Wraps a handle already bound to the given CAN device number.
    ///
    /// Starts out in percent output mode with a commanded speed of 0.
    pub fn new(device_number: u8, talon: T) -> Self {
        Self {
            talon,
            device_number,
            control_mode: ControlMode::default(),
            current_speed: 0.0,
            encoder_multiplier: 1,
            pid_idx: 0,
        }
    }

    /// CAN device number this wrapper was constructed with
    pub fn device_number(&self) -> u8 {
        self.device_number
    }

    /// Control mode applied to subsequent speed commands
    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    /// Borrow the wrapped driver handle
    pub fn talon(&self) -> &T {
        &self.talon
    }

    /// Switch the control mode. Pure local state, takes effect on the next
    /// [`set`](Self::set) or [`enable`](Self::enable).
    pub fn change_control_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode;
    }

    /// Command a speed in the current control mode.
    ///
    /// The stored speed is updated before the hardware forward, so
    /// [`get`](Self::get) reflects the new value even when the forward fails.
    /// The value sent to the device is scaled by the encoder multiplier; the
    /// stored value is not.
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn set(&mut self, speed: f64) -> Result<(), T::Error> {
        self.current_speed = speed;
        self.talon.set(
            self.control_mode,
            self.current_speed * f64::from(self.encoder_multiplier),
        )
    }

    /// Closed loop callback entry point. Unlike [`set`](Self::set) the value
    /// is forwarded raw, without the encoder multiplier.
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn pid_write(&mut self, output: f64) -> Result<(), T::Error> {
        self.current_speed = output;
        self.talon.set(self.control_mode, self.current_speed)
    }

    /// Re-send the stored speed in the current control mode, without the
    /// encoder multiplier.
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn enable(&mut self) -> Result<(), T::Error> {
        self.talon.set(self.control_mode, self.current_speed)
    }

    /// Command neutral output.
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn disable(&mut self) -> Result<(), T::Error> {
        self.talon.neutral_output()
    }

    /// Command neutral output. Identical to [`disable`](Self::disable).
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn stop_motor(&mut self) -> Result<(), T::Error> {
        self.talon.neutral_output()
    }

    /// Last commanded speed. Never a hardware read.
    pub fn get(&self) -> f64 {
        self.current_speed
    }

    /// Whether the output direction is inverted
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver can't be read.
    pub fn inverted(&self) -> Result<bool, T::Error> {
        self.talon.inverted()
    }

    /// Invert the output direction
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), T::Error> {
        self.talon.set_inverted(inverted)
    }

    /// Select brake or coast behavior for neutral output
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn enable_brake_mode(&mut self, brake_enabled: bool) -> Result<(), T::Error> {
        self.talon.set_neutral_mode(if brake_enabled {
            NeutralMode::Brake
        } else {
            NeutralMode::Coast
        })
    }

    /// Store the encoder ticks per revolution.
    ///
    /// Legacy oddity kept as observed: the value is applied as a raw
    /// multiplier on the [`set`](Self::set) output path and nowhere else. No
    /// device configuration happens here and sensor reads are unaffected.
    pub fn config_encoder_codes_per_rev(&mut self, ticks: i32) {
        self.encoder_multiplier = ticks;
    }

    /// Select the sensor source for the fixed closed loop slot
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// the configuration within the timeout.
    pub fn set_feedback_device(&mut self, device: FeedbackDevice) -> Result<(), T::Error> {
        debug!("selecting feedback sensor for device {}", self.device_number);
        self.talon
            .config_selected_feedback_sensor(device, self.pid_idx, CONFIG_TIMEOUT)
    }

    /// Invert the reported sensor direction
    ///
    /// # Errors
    ///
    /// This function will return an error if the driver rejects the command.
    pub fn reverse_sensor(&mut self, reversed: bool) -> Result<(), T::Error> {
        self.talon.set_sensor_phase(reversed)
    }

    /// Position of the selected sensor in raw sensor units
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    pub fn selected_sensor_position(&mut self) -> Result<i32, T::Error> {
        self.talon.selected_sensor_position(self.pid_idx)
    }

    /// Velocity of the selected sensor in raw sensor units per 100 ms
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    pub fn selected_sensor_velocity(&mut self) -> Result<i32, T::Error> {
        self.talon.selected_sensor_velocity(self.pid_idx)
    }

    /// Output current reported by the device, in amperes
    ///
    /// # Errors
    ///
    /// This function will return an error if the device can't be read.
    pub fn output_current(&mut self) -> Result<f64, T::Error> {
        self.talon.output_current()
    }

    /// Write a full gain set into a profile slot and make it active.
    ///
    /// Issues the six configuration calls and the slot selection in a fixed
    /// order. There is no rollback: if a call fails, the earlier ones have
    /// already taken effect on the device.
    ///
    /// # Errors
    ///
    /// This function will return an error if any configuration call isn't
    /// acknowledged within the timeout.
    #[allow(clippy::too_many_arguments)]
    pub fn set_pid(
        &mut self,
        p_gain: f64,
        i_gain: f64,
        d_gain: f64,
        f_gain: f64,
        integral_zone: i32,
        ramp_rate: f64,
        slot: u8,
    ) -> Result<(), T::Error> {
        debug!("writing gain set into profile slot {}", slot);
        self.talon.config_kp(slot, p_gain, CONFIG_TIMEOUT)?;
        self.talon.config_ki(slot, i_gain, CONFIG_TIMEOUT)?;
        self.talon.config_kd(slot, d_gain, CONFIG_TIMEOUT)?;
        self.talon.config_kf(slot, f_gain, CONFIG_TIMEOUT)?;
        self.talon
            .config_integral_zone(slot, integral_zone, CONFIG_TIMEOUT)?;
        self.talon
            .config_closed_loop_ramp(ramp_rate, CONFIG_TIMEOUT)?;
        self.talon.select_profile_slot(slot, self.pid_idx)
    }

    /// Clear sticky fault flags latched on the device
    ///
    /// # Errors
    ///
    /// This function will return an error if the device doesn't acknowledge
    /// within the timeout.
    #[deprecated(note = "kept for legacy callers")]
    pub fn clear_sticky_faults(&mut self) -> Result<(), T::Error> {
        self.talon.clear_sticky_faults(CONFIG_TIMEOUT)
    }

    /// Does nothing. The current driver no longer exposes nominal output
    /// voltage configuration, so the call is silently ignored.
    #[deprecated(note = "not supported by the current driver, silently ignored")]
    pub fn config_nominal_output_voltage(&mut self, _forward_voltage: f64, _reverse_voltage: f64) {}

    /// Does nothing. The current driver no longer exposes peak output voltage
    /// configuration, so the call is silently ignored.
    #[deprecated(note = "not supported by the current driver, silently ignored")]
    pub fn config_peak_output_voltage(&mut self, _forward_voltage: f64, _reverse_voltage: f64) {}

    /// Widget type tag reported to the dashboard
    pub fn smart_dashboard_type(&self) -> &'static str {
        SMART_DASHBOARD_TYPE
    }

    /// Display name stored on the handle
    pub fn name(&self) -> Option<&str> {
        self.talon.name()
    }

    /// Assign the display name on the handle
    pub fn set_name(&mut self, name: &str) {
        self.talon.set_name(name);
    }

    /// Subsystem label stored on the handle
    pub fn subsystem(&self) -> Option<&str> {
        self.talon.subsystem()
    }

    /// Assign the subsystem label on the handle
    pub fn set_subsystem(&mut self, subsystem: &str) {
        self.talon.set_subsystem(subsystem);
    }
}

impl<T: TalonSrx> SpeedController for CanTalon<T> {
    type Error = T::Error;

    fn get(&self) -> f64 {
        self.get()
    }

    fn set(&mut self, speed: f64) -> Result<(), T::Error> {
        self.set(speed)
    }

    fn pid_write(&mut self, output: f64) -> Result<(), T::Error> {
        self.pid_write(output)
    }

    fn inverted(&self) -> Result<bool, T::Error> {
        self.inverted()
    }

    fn set_inverted(&mut self, inverted: bool) -> Result<(), T::Error> {
        self.set_inverted(inverted)
    }

    fn disable(&mut self) -> Result<(), T::Error> {
        self.disable()
    }

    fn stop_motor(&mut self) -> Result<(), T::Error> {
        self.stop_motor()
    }
}

impl<T: TalonSrx> Sendable for CanTalon<T> {
    fn name(&self) -> Option<&str> {
        self.name()
    }

    fn set_name(&mut self, name: &str) {
        self.set_name(name);
    }

    fn subsystem(&self) -> Option<&str> {
        self.subsystem()
    }

    fn set_subsystem(&mut self, subsystem: &str) {
        self.set_subsystem(subsystem);
    }

    fn init_sendable(&mut self, builder: &mut dyn SendableBuilder<Self>) {
        builder.set_smart_dashboard_type(SMART_DASHBOARD_TYPE);
        // the dashboard has nowhere to route driver errors, so the callbacks
        // discard them
        builder.set_safe_state(|talon: &mut Self| {
            let _ = talon.disable();
        });
        builder.add_double_property(
            "Value",
            |talon: &Self| talon.get(),
            |talon: &mut Self, value| {
                let _ = talon.set(value);
            },
        );
    }
}

/// Identity is the device number plus the wrapped handle; locally tracked
/// command state does not participate.
impl<T: PartialEq> PartialEq for CanTalon<T> {
    fn eq(&self, other: &Self) -> bool {
        self.device_number == other.device_number && self.talon == other.talon
    }
}

impl<T: Eq> Eq for CanTalon<T> {}

impl<T: Hash> Hash for CanTalon<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.device_number.hash(state);
        self.talon.hash(state);
    }
}

impl<T: TalonSrx> fmt::Display for CanTalon<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanTalon({}", self.device_number)?;
        if let Some(subsystem) = self.talon.subsystem() {
            write!(f, ",{subsystem}")?;
        }
        if let Some(name) = self.talon.name() {
            write!(f, ",{name}")?;
        }
        write!(f, ")")
    }
}
