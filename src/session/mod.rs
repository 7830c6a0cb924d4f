pub mod observer;
pub mod quiz;
pub mod result;
pub mod scheduler;
