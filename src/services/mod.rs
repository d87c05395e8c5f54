pub mod announcement;
pub mod attendance;
pub mod crud;
pub mod event;
pub mod member_info;
pub mod profile_photo;
pub mod user;
pub mod user_role;
