//! The two multiplexed channels.
//!
//! Within one multiplexer iteration the primary channel is always serviced
//! before the secondary one. When both are ready at the same time the primary
//! line is emitted first.

use std::fmt;

/// One of the two captured output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// The child's stdout.
    Primary,
    /// The child's stderr.
    Secondary,
}

impl Channel {
    /// Per-iteration service order.
    pub const SERVICE_ORDER: [Channel; 2] = [Channel::Primary, Channel::Secondary];

    /// Label written in front of every line from this channel.
    pub fn label(self) -> &'static str {
        match self {
            Channel::Primary => "STDOUT",
            Channel::Secondary => "STDERR",
        }
    }

    /// Slot index (primary = 0, secondary = 1).
    pub fn index(self) -> usize {
        match self {
            Channel::Primary => 0,
            Channel::Secondary => 1,
        }
    }

    /// The channel that is not `self`.
    pub fn other(self) -> Channel {
        match self {
            Channel::Primary => Channel::Secondary,
            Channel::Secondary => Channel::Primary,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
