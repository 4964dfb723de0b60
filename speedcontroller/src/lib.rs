//! Legacy speed controller and dashboard contracts
//!
//! The robotics framework that used to define these interfaces dropped them.
//! They live on here so application code written against the old surface
//! keeps compiling against current driver crates.

#![cfg_attr(any(not(test), target_arch = "arm"), no_std)]

use blanket::blanket;

/// Generic motor speed controller commanded with values in `[-1.0, 1.0]`
#[blanket(derive(Mut))]
pub trait SpeedController {
    type Error;

    /// Last commanded speed. A locally stored value, not a hardware read.
    fn get(&self) -> f64;

    /// Command a speed as a fraction of maximum output magnitude.
    ///
    /// No clamping is performed at this layer.
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver rejects
    /// the command.
    fn set(&mut self, speed: f64) -> Result<(), Self::Error>;

    /// Callback target for an external closed loop controller.
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver rejects
    /// the command.
    fn pid_write(&mut self, output: f64) -> Result<(), Self::Error>;

    /// Whether the output direction is inverted
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver can't be
    /// read.
    fn inverted(&self) -> Result<bool, Self::Error>;

    /// Invert the output direction
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver rejects
    /// the command.
    fn set_inverted(&mut self, inverted: bool) -> Result<(), Self::Error>;

    /// Drive the output to neutral
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver rejects
    /// the command.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Drive the output to neutral. Same effect as [`disable`](Self::disable),
    /// both names exist in the legacy surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if the underlying driver rejects
    /// the command.
    fn stop_motor(&mut self) -> Result<(), Self::Error>;
}

/// Object that can describe itself to the dashboard
pub trait Sendable {
    /// Display name, if one has been assigned
    fn name(&self) -> Option<&str>;

    /// Assign the display name
    fn set_name(&mut self, name: &str);

    /// Owning subsystem label, if one has been assigned
    fn subsystem(&self) -> Option<&str>;

    /// Assign the owning subsystem label
    fn set_subsystem(&mut self, subsystem: &str);

    /// Attach this object's dashboard bindings to a builder.
    ///
    /// The dashboard may apply the registered callbacks from its own
    /// scheduling context; no synchronization is provided here.
    fn init_sendable(&mut self, builder: &mut dyn SendableBuilder<Self>)
    where
        Self: Sized;
}

/// Builder collaborator handed to [`Sendable::init_sendable`].
///
/// Callbacks are registered as plain function pointers and applied by the
/// dashboard to the object it holds, so the contract works without `alloc`.
pub trait SendableBuilder<S> {
    /// Tag selecting the widget type on the dashboard
    fn set_smart_dashboard_type(&mut self, kind: &'static str);

    /// Action driving the object into a safe state
    fn set_safe_state(&mut self, safe_state: fn(&mut S));

    /// Read/write numeric property shown on the dashboard
    fn add_double_property(
        &mut self,
        name: &'static str,
        getter: fn(&S) -> f64,
        setter: fn(&mut S, f64),
    );
}

#[cfg(not(any(not(test), target_arch = "arm")))]
mod tests {
    use crate::{Sendable, SendableBuilder, SpeedController};

    #[derive(Default)]
    struct Recorder {
        speed: f64,
        inverted: bool,
        stopped: bool,
        name: Option<String>,
    }

    impl SpeedController for Recorder {
        type Error = ();

        fn get(&self) -> f64 {
            self.speed
        }

        fn set(&mut self, speed: f64) -> Result<(), ()> {
            self.speed = speed;
            Ok(())
        }

        fn pid_write(&mut self, output: f64) -> Result<(), ()> {
            self.speed = output;
            Ok(())
        }

        fn inverted(&self) -> Result<bool, ()> {
            Ok(self.inverted)
        }

        fn set_inverted(&mut self, inverted: bool) -> Result<(), ()> {
            self.inverted = inverted;
            Ok(())
        }

        fn disable(&mut self) -> Result<(), ()> {
            self.stopped = true;
            Ok(())
        }

        fn stop_motor(&mut self) -> Result<(), ()> {
            self.stopped = true;
            Ok(())
        }
    }

    impl Sendable for Recorder {
        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }

        fn set_name(&mut self, name: &str) {
            self.name = Some(name.to_string());
        }

        fn subsystem(&self) -> Option<&str> {
            None
        }

        fn set_subsystem(&mut self, _subsystem: &str) {}

        fn init_sendable(&mut self, builder: &mut dyn SendableBuilder<Self>) {
            builder.set_smart_dashboard_type("Recorder");
            builder.set_safe_state(|r| {
                let _ = r.disable();
            });
            builder.add_double_property(
                "Value",
                |r| r.get(),
                |r, value| {
                    let _ = r.set(value);
                },
            );
        }
    }

    struct Bindings<S> {
        dashboard_type: Option<&'static str>,
        safe_state: Option<fn(&mut S)>,
        property: Option<(&'static str, fn(&S) -> f64, fn(&mut S, f64))>,
    }

    impl<S> Bindings<S> {
        fn new() -> Self {
            Self {
                dashboard_type: None,
                safe_state: None,
                property: None,
            }
        }
    }

    impl<S> SendableBuilder<S> for Bindings<S> {
        fn set_smart_dashboard_type(&mut self, kind: &'static str) {
            self.dashboard_type = Some(kind);
        }

        fn set_safe_state(&mut self, safe_state: fn(&mut S)) {
            self.safe_state = Some(safe_state);
        }

        fn add_double_property(
            &mut self,
            name: &'static str,
            getter: fn(&S) -> f64,
            setter: fn(&mut S, f64),
        ) {
            self.property = Some((name, getter, setter));
        }
    }

    fn command(controller: &mut impl SpeedController<Error = ()>, speed: f64) {
        controller.set(speed).unwrap();
    }

    #[test]
    fn mutable_reference_satisfies_contract() {
        let mut recorder = Recorder::default();
        command(&mut &mut recorder, 0.5);
        assert_eq!(recorder.speed, 0.5);
    }

    #[test]
    fn registered_bindings_apply_to_the_object() {
        let mut recorder = Recorder::default();
        let mut bindings = Bindings::new();
        recorder.init_sendable(&mut bindings);

        assert_eq!(bindings.dashboard_type, Some("Recorder"));

        let (name, getter, setter) = bindings.property.unwrap();
        assert_eq!(name, "Value");
        setter(&mut recorder, 0.75);
        assert_eq!(getter(&recorder), 0.75);

        bindings.safe_state.unwrap()(&mut recorder);
        assert!(recorder.stopped);
    }
}
