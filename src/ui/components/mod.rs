pub mod falling_board;
pub mod prompt;
pub mod snake_board;
pub mod spiral_board;
pub mod status_bar;
pub mod summary;
pub mod timer_bar;
