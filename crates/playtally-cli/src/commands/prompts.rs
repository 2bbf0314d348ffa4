use color_eyre::Result;
use std::io::IsTerminal;

/// Read the API key without echoing it
pub fn prompt_api_key() -> Result<String> {
    let key = rpassword::prompt_password("Tautulli API key: ")
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read API key: {}", e))?;
    Ok(key.trim().to_string())
}

pub fn can_prompt() -> bool {
    std::io::stdin().is_terminal()
}
