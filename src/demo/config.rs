//! Collaborator demonstrations: settings read from INI files and test rows
//! loaded from a CSV file

use std::path::{Path, PathBuf};

use crate::collab::{DataTable, IniConfig};
use crate::common::Result;
use crate::engine::{Mark, TestCase, TestModule};
use crate::fixture::{FixtureDef, ParamValue, Scope, Setup};

fn ini_fixture(name: &str, path: PathBuf) -> FixtureDef {
    FixtureDef::new(name, move |_| Ok(Setup::value(IniConfig::load(&path)?))).scope(Scope::Module)
}

/// The `config` demo module; INI files live in `<data_dir>/config`
pub fn module(data_dir: &Path) -> Result<TestModule> {
    let config_dir = data_dir.join("config");
    let mut module = TestModule::new("config");

    module.fixture(ini_fixture("qa_config", config_dir.join("qa.ini")))?;
    module.fixture(ini_fixture("prod_config", config_dir.join("prod.ini")))?;

    let env_dir = config_dir.clone();
    module.fixture(
        FixtureDef::new("env_config", move |req| {
            let env = req.param()?.to_string();
            let config = IniConfig::load(&env_dir.join(format!("{env}.ini")))?;
            Ok(Setup::value((env, config)))
        })
        .scope(Scope::Module)
        .params([ParamValue::new("qa"), ParamValue::new("prod")]),
    )?;

    module.test(
        TestCase::new("test_gmail_url_qa", |ctx| {
            let config = ctx.get::<IniConfig>("qa_config")?;
            check_eq!(config.get("gmail", "url")?, "qa.gmail.com");
            Ok(())
        })
        .uses(["qa_config"]),
    );

    module.test(
        TestCase::new("test_gmail_url_prod", |ctx| {
            let config = ctx.get::<IniConfig>("prod_config")?;
            check_eq!(config.get("gmail", "url")?, "qa_prod.gmail.com");
            Ok(())
        })
        .uses(["prod_config"]),
    );

    module.test(
        TestCase::new("test_outlook_account", |ctx| {
            let config = ctx.get::<IniConfig>("qa_config")?;
            check!(config.get("outlook", "url")?.ends_with("outlook.com"));
            check!(!config.get("outlook", "user")?.is_empty());
            Ok(())
        })
        .uses(["qa_config"]),
    );

    module.test(
        TestCase::new("test_every_env_has_credentials", |ctx| {
            let (env, config) = ctx.get::<(String, IniConfig)>("env_config")?;
            for key in ["url", "user", "pass"] {
                let value = config.get("gmail", key)?;
                check!(!value.is_empty(), "[{}] gmail.{} is empty", env, key);
            }
            Ok(())
        })
        .uses(["env_config"]),
    );

    Ok(module)
}

/// The `data` demo module: one login check per row of `<data_dir>/data.csv`
///
/// A missing data file skips the test instead of failing the session.
pub fn data_module(data_dir: &Path) -> TestModule {
    let path = data_dir.join("data.csv");
    let mut module = TestModule::new("data");

    let case = TestCase::new("test_login_rows", |ctx| {
        let user = ctx.string("username")?;
        let password = ctx.string("password")?;
        check!(!user.is_empty(), "row without a username");
        check!(
            password.len() >= 6,
            "password for '{}' is shorter than 6 characters",
            user
        );
        Ok(())
    });

    let case = match DataTable::load(&path) {
        Ok(table) => case.parametrize("username, password", table.param_rows()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "data file unavailable");
            case.mark(Mark::skip(e.to_string()))
        }
    };
    module.test(case);

    module
}
