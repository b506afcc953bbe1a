//! Per-browser storage for the session artifact.
//!
//! In production this is a set of cookies; tests use [`MemoryJar`].

use time::Duration;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

pub const ACCESS_TOKEN_COOKIE:  &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
pub const CODE_VERIFIER_COOKIE: &str = "sb-code-verifier";

pub trait SessionJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, max_age: Duration);
    fn remove(&self, name: &str);
}

/// Cookie-backed jar for one request.
#[derive(Clone)]
pub struct CookieJar {
    cookies: Cookies,
    secure:  bool,
}

impl CookieJar {
    pub fn new(cookies: Cookies, secure: bool) -> Self {
        Self { cookies, secure }
    }
}

impl SessionJar for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .get(name)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn set(&self, name: &str, value: &str, max_age: Duration) {
        // Lax, not Strict: the magic link is a cross-site navigation and the
        // verifier has to be sent along with it.
        let cookie = Cookie::build((name.to_owned(), value.to_owned()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .build();
        self.cookies.add(cookie);
    }

    fn remove(&self, name: &str) {
        let cookie = Cookie::build((name.to_owned(), ""))
            .http_only(true)
            .path("/")
            .max_age(Duration::ZERO)
            .build();
        self.cookies.add(cookie);
    }
}

#[cfg(test)]
pub use memory::MemoryJar;
