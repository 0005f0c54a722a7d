mod common;
mod progression;
mod selector;
