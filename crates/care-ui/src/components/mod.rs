pub mod guard;
pub mod nav;
pub mod stat_card;
pub mod status;
pub mod toast;
