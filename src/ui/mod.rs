pub mod approvals;
pub mod bottom_bar;
pub mod input;
pub mod modal;
pub mod top;
pub mod util;
