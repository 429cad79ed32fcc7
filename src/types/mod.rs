pub mod date_window;
pub mod outcome;
pub mod sample;
pub mod station;
pub mod stream;
