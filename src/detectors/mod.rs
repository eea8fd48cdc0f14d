//! Candlestick pattern detectors
//!
//! # Pattern Categories
//!
//! - **Single-bar (7)**: Spinning Top, Marubozu, Doji, Hammer family
//! - **Two-bar (13)**: Engulfing, Tweezers, Harami, Piercing, Dark Cloud Cover,
//!   Matching High/Low, Kickers, Inside Bar
//! - **Three-bar (10)**: Stars, Soldiers/Crows, Three Inside, Three Outside,
//!   Abandoned Baby
//! - **Four-bar (2)**: Three-Line Strike

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
    ($($detector:ty),* $(,)?) => {
        $(impl $detector {
            pub fn with_defaults() -> Self { Self::default() }
        })*
    };
}

/// The `$n`-bar window ending at `$bar`, oldest first; returns
/// [`Detection::InsufficientHistory`](crate::Detection) from the enclosing
/// `detect` when the chain is too short there.
macro_rules! window_or_return {
    ($bar:expr, $n:literal) => {
        match $bar.window::<$n>() {
            Some(window) => window,
            None => return $crate::Detection::insufficient($n - 1, $bar.history()),
        }
    };
}

pub mod four_bar;
pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use four_bar::*;
pub use helpers::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;
