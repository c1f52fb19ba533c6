//! 기본 설정 파일 생성 명령어.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use screener_core::AppConfig;

const HEADER: &str = "\
# 스크리너 설정
#
# 환경 변수로 덮어쓸 수 있습니다 (접두사 SCREENER, 구분자 __).
# 예: SCREENER__SCREENER__MIN_ADX=25

";

/// 기본 설정을 TOML 문자열로 렌더링합니다.
pub fn render_default_config() -> Result<String> {
    let body = toml::to_string_pretty(&AppConfig::default())
        .context("Failed to serialize default config")?;
    Ok(format!("{}{}", HEADER, body))
}

/// 기본 설정 파일을 씁니다.
///
/// 파일이 이미 있으면 `force`일 때만 덮어씁니다.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, render_default_config()?)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    info!("Default config written to: {}", path.display());
    Ok(())
}
