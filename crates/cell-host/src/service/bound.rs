//! Transaction handle over one bound channel.
//!
//! This is what the device hands to the network and to other callers that
//! want the bound storage directly. Every transaction goes back through the
//! controller, so a committed change always blinks slot 0, marks the device
//! for persistence and is reported to the grid.

use crate::domain::{ActionSource, Actionable, Channel, ChannelStack};

use super::controller::ChestController;

pub struct BoundCell<'a> {
    chest: &'a mut ChestController,
    channel: Channel,
    priority: i32,
}

impl<'a> BoundCell<'a> {
    pub(crate) fn new(chest: &'a mut ChestController, channel: Channel, priority: i32) -> Self {
        Self {
            chest,
            channel,
            priority,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Routing precedence carried into the network.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn available(&mut self) -> Vec<ChannelStack> {
        self.chest.available(self.channel).unwrap_or_default()
    }

    /// Returns what was not stored. Stacks of another channel bounce.
    pub fn inject(
        &mut self,
        stack: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Option<ChannelStack> {
        if stack.channel() != self.channel {
            return Some(stack);
        }
        match self.chest.inject(stack, mode, source) {
            Ok(rest) => rest,
            Err(_) => Some(stack),
        }
    }

    /// Returns what was obtained.
    pub fn extract(
        &mut self,
        request: ChannelStack,
        mode: Actionable,
        source: &ActionSource,
    ) -> Option<ChannelStack> {
        if request.channel() != self.channel {
            return None;
        }
        self.chest.extract(request, mode, source).ok().flatten()
    }
}
