use tracing::debug;

/// Decides whether the remote tank should be consulted.
pub trait Connectivity {
    fn is_online(&self) -> bool;
}

impl<T: Connectivity + ?Sized> Connectivity for &T {
    fn is_online(&self) -> bool {
        (**self).is_online()
    }
}

/// Best effort probe: a single blocking GET. Any error, including a timeout of the HTTP
/// client, counts as offline. The response status is not inspected.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    url: String,
}

impl HttpProbe {
    pub fn new<S: ToString>(url: S) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl Connectivity for HttpProbe {
    fn is_online(&self) -> bool {
        match reqwest::blocking::get(&self.url) {
            Ok(_) => true,
            Err(e) => {
                debug!("connectivity probe to {} failed: {e}", self.url);
                false
            }
        }
    }
}

/// Always offline. Forces the local copy to be used without any network access.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Connectivity for Offline {
    fn is_online(&self) -> bool {
        false
    }
}
