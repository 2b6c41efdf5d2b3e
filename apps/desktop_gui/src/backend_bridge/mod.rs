//! Backend side of the GUI: the runtime that cache fetches are spawned on.

pub mod runtime;
