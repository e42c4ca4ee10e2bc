pub mod admin;
pub mod donate;
pub mod donors;
pub mod event_details;
pub mod events;
pub mod home;
pub mod leaderboard;
pub mod login;
pub mod my_dashboard;
