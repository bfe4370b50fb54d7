// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction handlers and the device events a window routes to them.
//!
//! A [`Window`](crate::Window) holds at most one [`Interaction`]. Device
//! events arrive through the window's routing methods (or
//! [`Window::handle_event`](crate::Window::handle_event)), are turned into
//! [`InteractionEvent`]s and delivered together with the scene they concern:
//!
//! - pointer enter and exit become focus events for the scene under the
//!   pointer,
//! - motion is hit-tested on every call,
//! - a button press records the scene under the pointer, and drags and the
//!   release go to that scene even when the pointer has left it.

use crate::scene::Scene;

/// Pointer buttons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    /// Primary button.
    One,
    /// Middle button.
    Two,
    /// Secondary button.
    Three,
}

/// Logical events delivered to an [`Interaction`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InteractionEvent {
    /// The handler is being replaced or removed. Sent with no scene and
    /// coordinates `(0, 0)`.
    Abort,
    /// The pointer moved with no button held.
    Motion,
    /// The pointer entered the window.
    FocusIn,
    /// The pointer left the window.
    FocusOut,
    /// A button went down.
    ButtonDown(Button),
    /// The pointer moved with a button held.
    ButtonDrag(Button),
    /// A button was released.
    ButtonUp(Button),
    /// Reserved; never emitted by the window.
    DoubleClick,
}

/// A client handler for pointer gestures.
///
/// `scene` is the scene the event concerns, or `None` when the pointer is
/// over no scene (and for [`InteractionEvent::Abort`]). Coordinates are
/// device pixels relative to the window.
pub trait Interaction {
    /// Handles one event.
    fn event(&mut self, scene: Option<&mut Scene>, event: InteractionEvent, x: i32, y: i32);
}

impl<F> Interaction for F
where
    F: FnMut(Option<&mut Scene>, InteractionEvent, i32, i32),
{
    fn event(&mut self, scene: Option<&mut Scene>, event: InteractionEvent, x: i32, y: i32) {
        self(scene, event, x, y);
    }
}

/// Input as delivered by the host toolkit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeviceEvent {
    /// The pointer entered the window at `(x, y)`.
    PointerEntered {
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// The pointer left the window at `(x, y)`.
    PointerExited {
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// The pointer moved with no button held.
    PointerMoved {
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// A button went down.
    ButtonPressed {
        /// Which button.
        button: Button,
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// The pointer moved with `button` held.
    PointerDragged {
        /// Which button.
        button: Button,
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// A button was released.
    ButtonReleased {
        /// Which button.
        button: Button,
        /// Device x.
        x: i32,
        /// Device y.
        y: i32,
    },
    /// The host surface changed size.
    Resized {
        /// New width in device pixels.
        width: u32,
        /// New height in device pixels.
        height: u32,
    },
}
