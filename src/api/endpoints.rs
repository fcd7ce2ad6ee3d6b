//! Backend endpoint paths, relative to the API base URL.

pub const LOGIN: &str = "auth/login/";
pub const REGISTER: &str = "auth/register/";
pub const LOGOUT: &str = "auth/logout/";
pub const TOKEN_REFRESH: &str = "auth/token/refresh/";
pub const PROFILE: &str = "auth/profile/";
pub const CHANGE_PASSWORD: &str = "auth/change-password/";
