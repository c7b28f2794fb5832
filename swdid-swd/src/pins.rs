// Copyright (C) 2025 swdid contributors
//
// MIT License

//! SWD pin abstraction
//!
//! SWCLK is a plain [`OutputPin`].  SWDIO is shared between host and target,
//! so on top of the `embedded-hal` input and output traits it needs a way to
//! switch the pin's direction - which `embedded-hal` 1.0 does not provide.
//! That is what [`SwdioPin`] adds.
//!
//! With the `esp32c3` feature, [`SwdioPin`] is implemented for `esp-hal`'s
//! `Flex` pin, and [`from_pins()`] builds a complete [`SwdSession`] from two
//! `esp-hal` GPIO peripherals.
//!
//! [`SwdSession`]: crate::SwdSession

use embedded_hal::digital::{InputPin, OutputPin};

/// A bidirectional pin suitable for SWDIO.
///
/// Switching direction must not change the level the pin drives once it is
/// an output again - the link relies on this when it turns the bus around.
pub trait SwdioPin: InputPin + OutputPin {
    /// Stop sampling the pin and start driving it.
    fn set_as_output(&mut self);

    /// Stop driving the pin, so the target can drive it, and start sampling
    /// it.
    fn set_as_input(&mut self);
}

#[cfg(feature = "esp32c3")]
pub use esp::from_pins;

#[cfg(feature = "esp32c3")]
mod esp {
    use esp_hal::delay::Delay;
    use esp_hal::gpio::{
        DriveMode, DriveStrength, Flex, InputConfig, Level, Output, OutputConfig, Pull,
    };
    #[allow(unused_imports)]
    use log::{debug, error, info, trace, warn};

    use super::SwdioPin;
    use crate::link::SwdLink;
    use crate::session::SwdSession;

    impl SwdioPin for Flex<'_> {
        #[inline]
        fn set_as_output(&mut self) {
            self.set_input_enable(false);
            self.set_output_enable(true);
        }

        #[inline]
        fn set_as_input(&mut self) {
            self.set_output_enable(false);
            self.set_input_enable(true);
        }
    }

    /// Creates a new SWD session from ESP32 GPIO pins.
    ///
    /// SWDIO has no pull configured - it is the target's responsibility to
    /// pull SWDIO high.  SWCLK is a 20mA push-pull output, starting low.
    ///
    /// ```rust,ignore
    /// let peripherals = esp_hal::init(config);
    /// let mut session = swdid_swd::from_pins(peripherals.GPIO0, peripherals.GPIO1);
    ///
    /// match session.run_handshake() {
    ///     Ok(idcode) => info!("IDCODE: {idcode:#}"),
    ///     Err(e) => warn!("No device found: {e}"),
    /// }
    /// ```
    pub fn from_pins<'a>(
        swdio_pin: impl esp_hal::gpio::InputPin + esp_hal::gpio::OutputPin + 'a,
        swclk_pin: impl esp_hal::gpio::OutputPin + 'a,
    ) -> SwdSession<Flex<'a>, Output<'a>, Delay> {
        let mut swdio = Flex::new(swdio_pin);
        let input_config = InputConfig::default().with_pull(Pull::None);
        swdio.apply_input_config(&input_config);
        swdio.apply_output_config(&OutputConfig::default().with_drive_mode(DriveMode::PushPull));
        swdio.set_input_enable(true);

        let output_config = OutputConfig::default()
            .with_drive_strength(DriveStrength::_20mA)
            .with_drive_mode(DriveMode::PushPull);
        let swclk = Output::new(swclk_pin, Level::Low, output_config);

        debug!("SWD pins created, SWDIO without pull, SWCLK output low");

        SwdSession::new(SwdLink::new(swdio, swclk, Delay::new()))
    }
}
