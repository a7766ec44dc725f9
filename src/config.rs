//! Runtime configuration: prompt templates (optionally from TOML) and
//! server settings read from the environment.
//!
//! See `PromptsConfig` and `Prompts` for the expected TOML schema.

use serde::Deserialize;
use tracing::{error, info};

/// Default request body limit for uploads (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Templates used to build the request parts.
/// Placeholders: `{level}`, `{content}`, `{name}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub instruction_template: String,
  pub source_text_template: String,
  pub text_file_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      instruction_template: DEFAULT_INSTRUCTION.trim().to_string(),
      source_text_template: "[Contenu Source Textuel Principal]:\n```\n{content}\n```".into(),
      text_file_template:
        "\n\n--- Contenu du fichier {name} ---\n{content}\n--- Fin du fichier {name} ---".into(),
    }
  }
}

const DEFAULT_INSTRUCTION: &str = r#"
ROLE: Vous êtes un expert en ingénierie pédagogique et un spécialiste du domaine traité dans le contenu source.

TÂCHE: Transformer le [Contenu Source] (fourni sous forme de texte et/ou de divers fichiers) en un ensemble de ressources pédagogiques multimodales. Votre mission principale est non seulement d'analyser le contenu fourni, mais aussi de **réutiliser et d'intégrer activement des éléments (textes, données, concepts, schémas) issus des fichiers joints** dans les ressources que vous générez.

CONTRAINTES:
1. Rigueur Scientifique: Maintenir une rigueur scientifique et une exactitude absolues basées sur TOUT le contenu fourni.
2. Transposition Didactique: Rendre le contenu accessible, engageant et adapté à un public apprenant.
3. Complexité Cognitive: Adapter la complexité de TOUTES les ressources générées au niveau de la Taxonomie de Bloom spécifié: "{level}".

INSTRUCTION IMPORTANTE: Analysez le texte fourni ainsi que tous les fichiers joints (images, documents texte, PDF, diaporamas, etc.). **Vous devez explicitement réutiliser des extraits, des données, ou des concepts provenant de ces fichiers** pour formuler les questions du quiz, construire le scénario de l'étude de cas, et concevoir les autres matériels.

FORMAT DE SORTIE:
Répondez UNIQUEMENT avec un seul objet JSON valide conforme au schéma fourni, sans aucun autre texte. La racine de l'objet doit être une clé unique "educationalResources" contenant toutes les ressources.
"#;

/// Attempt to load prompts from PROMPTS_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_prompts_config_from_env() -> Option<PromptsConfig> {
  let path = std::env::var("PROMPTS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_prompts_config(&s) {
      Ok(cfg) => {
        info!(target: "pedagen_backend", %path, "Loaded prompts config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pedagen_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pedagen_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_prompts_config(s: &str) -> Result<PromptsConfig, toml::de::Error> {
  toml::from_str::<PromptsConfig>(s)
}

/// Server-level settings from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
  pub port: u16,
  pub max_upload_bytes: usize,
}

impl ServerConfig {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
      .ok()
      .and_then(|v| v.parse::<usize>().ok())
      .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
    Self { port, max_upload_bytes }
  }
}
