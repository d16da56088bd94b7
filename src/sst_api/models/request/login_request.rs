use serde::Serialize;

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub language: &'a str,
}
