use crate::Result;
use std::{env, fs::create_dir_all, path::PathBuf};

const DATA_DIR_VAR: &str = "IVEND_DATA_DIR";
const BIND_VAR: &str = "IVEND_BIND";
const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DB_FILE_NAME: &str = "ivend.db";

#[derive(Clone, Debug)]
pub struct Conf {
    pub data_dir: PathBuf,
    pub bind: String,
}

impl Conf {
    pub fn from_env() -> Result<Conf> {
        let data_dir = match env::var(DATA_DIR_VAR) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };
        let bind = env::var(BIND_VAR)
            .ok()
            .filter(|it| !it.trim().is_empty())
            .unwrap_or(DEFAULT_BIND.into());
        Ok(Conf { data_dir, bind })
    }

    pub fn data_dir_file(&self, file_name: &str) -> Result<PathBuf> {
        if !self.data_dir.exists() {
            create_dir_all(&self.data_dir)?;
        }
        Ok(self.data_dir.join(file_name))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        self.data_dir_file(DB_FILE_NAME)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    #[allow(deprecated)]
    let home = env::home_dir().ok_or("Home directory does not exist")?;
    Ok(home.join(".local/share/ivend-ops"))
}

#[cfg(test)]
mod test {
    use super::Conf;
    use std::path::PathBuf;

    #[test]
    fn data_dir_file() -> crate::Result<()> {
        let dir = std::env::temp_dir().join(format!("ivend-conf-{}", std::process::id()));
        let conf = Conf {
            data_dir: dir.clone(),
            bind: "127.0.0.1:0".into(),
        };
        let path = conf.db_path()?;
        assert!(dir.exists());
        assert_eq!(PathBuf::from(&dir).join("ivend.db"), path);
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }
}
