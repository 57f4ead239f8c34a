use url::Url;

/// Joins a path to a url the way a reasonable person would expect: the
/// path of the base url is extended by the path, regardless of trailing
/// or leading slashes.
pub fn join(url: &Url, path: &str) -> Url {
    let mut url = url.clone();
    let base = url.path().trim_end_matches('/').to_string();
    let path = path.trim_start_matches('/');
    url.set_path(&format!("{base}/{path}"));
    url
}
