pub mod spin_timer;
