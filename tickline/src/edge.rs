// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Push button edge detector.
//!
//! The input is sampled once per main loop iteration and compared against
//! the last accepted state. There is no minimum dwell time.
//! A single bouncing sample produces a transition.

use crate::{
    context::{MainCtx, MainCtxCell},
    time::Millis,
};
use embedded_hal::digital::{InputPin, OutputPin};

/// Input level that means "pressed".
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Polarity {
    /// Pressed reads high (pull-down wiring).
    ActiveHigh,
    /// Pressed reads low (pull-up wiring).
    ActiveLow,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum ButtonState {
    Up,
    Down,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Edge {
    /// UP -> DOWN. `presses` is the count including this press.
    Pressed { at: Millis, presses: u16 },
    /// DOWN -> UP.
    Released { at: Millis },
}

impl Edge {
    pub fn at(&self) -> Millis {
        match self {
            Edge::Pressed { at, .. } | Edge::Released { at } => *at,
        }
    }
}

pub struct EdgeDetector {
    polarity: Polarity,
    state: MainCtxCell<ButtonState>,
    presses: MainCtxCell<u16>,
}

impl EdgeDetector {
    pub const fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            state: MainCtxCell::new(ButtonState::Up),
            presses: MainCtxCell::new(0),
        }
    }

    /// Bring the indicator in line with the initial UP state.
    pub fn init<O: OutputPin>(&self, _m: &MainCtx<'_>, indicator: &mut O) -> Result<(), O::Error> {
        indicator.set_low()
    }

    pub fn state(&self, m: &MainCtx<'_>) -> ButtonState {
        self.state.get(m)
    }

    pub fn presses(&self, m: &MainCtx<'_>) -> u16 {
        self.presses.get(m)
    }

    /// Sample the input once and run the state machine.
    ///
    /// `now` is the timestamp attached to a resulting event.
    pub fn poll<E, I, O>(
        &self,
        m: &MainCtx<'_>,
        now: Millis,
        input: &mut I,
        indicator: &mut O,
    ) -> Result<Option<Edge>, E>
    where
        I: InputPin<Error = E>,
        O: OutputPin<Error = E>,
    {
        let pressed = match self.polarity {
            Polarity::ActiveHigh => input.is_high()?,
            Polarity::ActiveLow => input.is_low()?,
        };

        match (self.state.get(m), pressed) {
            (ButtonState::Up, true) => {
                let presses = self.presses.get(m).wrapping_add(1);
                self.presses.set(m, presses);
                self.state.set(m, ButtonState::Down);
                indicator.set_high()?;
                Ok(Some(Edge::Pressed { at: now, presses }))
            }
            (ButtonState::Down, false) => {
                self.state.set(m, ButtonState::Up);
                indicator.set_low()?;
                Ok(Some(Edge::Released { at: now }))
            }
            (ButtonState::Up, false) | (ButtonState::Down, true) => Ok(None),
        }
    }
}


// vim: ts=4 sw=4 expandtab
