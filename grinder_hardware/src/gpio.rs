//! Raspberry Pi GPIO motor-enable output and grind-button input.

use rppal::gpio::{Gpio, InputPin, OutputPin};

use grinder_traits::{BoxError, DigitalInput, MotorEnable};

use crate::error::{HwError, Result};

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Motor-enable relay/driver line, active high. Starts low.
pub struct GpioMotor {
    pin: OutputPin,
}

impl GpioMotor {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let mut pin = gpio.get(pin).map_err(gpio_err)?.into_output();
        pin.set_low();
        Ok(Self { pin })
    }
}

impl MotorEnable for GpioMotor {
    fn set_enabled(&mut self, on: bool) -> std::result::Result<(), BoxError> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        tracing::debug!(on, pin = self.pin.pin(), "motor enable");
        Ok(())
    }
}

impl Drop for GpioMotor {
    fn drop(&mut self) {
        self.pin.set_low();
    }
}

/// Momentary grind button with the internal pull-down; high while pressed.
pub struct GpioButton {
    pin: InputPin,
}

impl GpioButton {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let pin = gpio.get(pin).map_err(gpio_err)?.into_input_pulldown();
        Ok(Self { pin })
    }
}

impl DigitalInput for GpioButton {
    fn is_high(&mut self) -> std::result::Result<bool, BoxError> {
        Ok(self.pin.is_high())
    }
}

/// Open the GPIO peripheral.
pub fn open() -> Result<Gpio> {
    Gpio::new().map_err(gpio_err)
}
