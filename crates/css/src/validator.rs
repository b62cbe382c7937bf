/// Decides whether a `src` entry in a stylesheet refers to a font in the map.
///
/// Arguments, in order:
/// - `target`: comparison key of the stylesheet path (basename, or the
///   resolved full path in full-path mode),
/// - `candidate`: comparison key of the font path, computed the same way,
/// - `url`: the path exactly as written inside `url(...)`,
/// - `key`: the font path as it was discovered.
///
/// Any `Fn(&str, &str, &str, &str) -> bool` closure is a validator.
pub trait Validator: Send + Sync {
    fn matches(&self, target: &str, candidate: &str, url: &str, key: &str) -> bool;
}

impl<F> Validator for F
where
    F: Fn(&str, &str, &str, &str) -> bool + Send + Sync,
{
    fn matches(&self, target: &str, candidate: &str, url: &str, key: &str) -> bool {
        self(target, candidate, url, key)
    }
}

/// The default validator: comparison keys must be equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrictEquality;

impl Validator for StrictEquality {
    fn matches(&self, target: &str, candidate: &str, _url: &str, _key: &str) -> bool {
        target == candidate
    }
}
