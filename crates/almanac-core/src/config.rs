use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::{
  DEFAULT_TIMEZONE,
  DayNormalizer,
  parse_week_start
};
use crate::error::CalendarResult;

const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const CONFIG_DIR_NAME: &str = "almanac";
const CONFIG_FILE_NAME: &str =
  "almanac.toml";

fn default_true() -> bool {
  true
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_timezone() -> String {
  DEFAULT_TIMEZONE.to_string()
}

fn default_max_markers() -> usize {
  3
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarConfig {
  #[serde(
    default = "default_week_start"
  )]
  pub week_start:  String,
  #[serde(default = "default_timezone")]
  pub timezone:    String,
  #[serde(default)]
  pub events:      Option<PathBuf>,
  #[serde(default)]
  pub display:     DisplayConfig,
  #[serde(skip)]
  pub loaded_from: Option<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct DisplayConfig {
  #[serde(default = "default_true")]
  pub color:       bool,
  #[serde(
    default = "default_max_markers"
  )]
  pub max_markers: usize
}

/// Validated options the calendar core
/// runs with.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarSettings {
  pub week_start: Weekday,
  pub normalizer: DayNormalizer
}

impl Default for CalendarSettings {
  fn default() -> Self {
    Self {
      week_start: Weekday::Sun,
      normalizer: DayNormalizer::utc()
    }
  }
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      week_start:  default_week_start(),
      timezone:    default_timezone(),
      events:      None,
      display:     DisplayConfig::default(),
      loaded_from: None
    }
  }
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      color:       true,
      max_markers: default_max_markers()
    }
  }
}

impl CalendarConfig {
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)?
    else {
      info!(
        "no calendar config found; \
         using defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading calendar config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg =
      Self::from_toml_str(&raw)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    cfg.loaded_from = Some(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg =
      toml::from_str::<Self>(raw)
        .map_err(|err| anyhow!("{err}"))?;
    cfg.sanitize();
    info!(
      week_start = %cfg.week_start,
      timezone = %cfg.timezone,
      color = cfg.display.color,
      max_markers = cfg.display.max_markers,
      "loaded calendar config"
    );
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      match key.trim() {
        | "week_start" => {
          self.week_start = value
        }
        | "timezone" => {
          self.timezone = value
        }
        | "events" => {
          self.events =
            Some(PathBuf::from(value))
        }
        | "display.color" => {
          self.display.color =
            parse_bool(&value)
              .ok_or_else(|| {
                anyhow!(
                  "invalid boolean for \
                   display.color: \
                   {value}"
                )
              })?;
        }
        | "display.max_markers" => {
          self.display.max_markers =
            value
              .trim()
              .parse()
              .with_context(|| {
                format!(
                  "invalid number for \
                   display.max_markers: \
                   {value}"
                )
              })?;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: \
             {other}"
          ));
        }
      }
    }
    self.sanitize();
    Ok(())
  }

  /// Resolves the textual options into
  /// the values the core uses, failing
  /// on anything it cannot interpret.
  pub fn settings(
    &self
  ) -> CalendarResult<CalendarSettings>
  {
    Ok(CalendarSettings {
      week_start: parse_week_start(
        &self.week_start
      )?,
      normalizer:
        DayNormalizer::from_id(
          &self.timezone
        )?
    })
  }

  pub fn events_path(
    &self
  ) -> Option<PathBuf> {
    self
      .events
      .as_deref()
      .map(expand_tilde)
  }

  fn sanitize(&mut self) {
    if self.week_start.trim().is_empty()
    {
      warn!(
        "blank week_start; using \
         default"
      );
      self.week_start =
        default_week_start();
    }

    if self.timezone.trim().is_empty() {
      warn!(
        "blank timezone; using \
         default"
      );
      self.timezone = default_timezone();
    }

    if self
      .events
      .as_ref()
      .is_some_and(|path| {
        path.as_os_str().is_empty()
      })
    {
      self.events = None;
    }
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    let path = expand_tilde(path);
    if !path.exists() {
      return Err(anyhow!(
        "config file does not exist: \
         {}",
        path.display()
      ));
    }
    return Ok(Some(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      let path =
        expand_tilde(Path::new(trimmed));
      if !path.exists() {
        return Err(anyhow!(
          "{CONFIG_ENV_VAR} points at a \
           missing file: {}",
          path.display()
        ));
      }
      return Ok(Some(path));
    }
  }

  let candidate =
    dirs::config_dir().map(|dir| {
      dir
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
    });
  match candidate {
    | Some(path) if path.exists() => {
      Ok(Some(path))
    }
    | _ => Ok(None)
  }
}

pub(crate) fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
