use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(folio_home: Option<PathBuf>, home_dir: Option<PathBuf>) -> Option<PathBuf> {
    match (folio_home, home_dir) {
        (Some(folio_home), _) => Some(folio_home.join(".env")),
        (None, Some(home)) => Some(home.join(".folio").join(".env")),
        (None, None) => None,
    }
}

pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("FOLIO_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );

    let Some(path) = fallback else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn fallback_prefers_folio_home() {
        let got = fallback_dotenv_path(
            Some(PathBuf::from("/srv/folio")),
            Some(PathBuf::from("/home/alice")),
        );
        assert_eq!(got, Some(PathBuf::from("/srv/folio/.env")));
    }

    #[test]
    fn fallback_uses_dot_folio_under_home() {
        let got = fallback_dotenv_path(None, Some(PathBuf::from("/home/alice")));
        assert_eq!(got, Some(PathBuf::from("/home/alice/.folio/.env")));
    }

    #[test]
    fn no_home_means_no_fallback() {
        assert_eq!(fallback_dotenv_path(None, None), None);
    }
}
