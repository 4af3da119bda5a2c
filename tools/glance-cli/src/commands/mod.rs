pub mod check;
pub mod profile;
pub mod run;
pub mod windows;
