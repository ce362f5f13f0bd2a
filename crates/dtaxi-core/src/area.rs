//! Feature-area configuration.
//!
//! Each back-office feature (contact messages, satisfaction surveys, driver
//! praise, coordination documents) is one instantiation of the same record
//! lifecycle, described by a [`FeatureArea`] value instead of its own code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

// ─── Collection layout ───────────────────────────────────────────────────────

/// Where live records of an area are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionLayout {
  /// Collection used for any category without an override.
  pub default:     String,
  /// Category → live collection overrides.
  #[serde(default)]
  pub by_category: BTreeMap<String, String>,
}

impl CollectionLayout {
  pub fn single(collection: impl Into<String>) -> Self {
    Self { default: collection.into(), by_category: BTreeMap::new() }
  }

  pub fn with(mut self, category: &str, collection: &str) -> Self {
    self.by_category.insert(category.to_owned(), collection.to_owned());
    self
  }

  /// The live collection a record of `category` belongs in.
  pub fn collection_for(&self, category: &str) -> &str {
    self
      .by_category
      .get(category)
      .map(String::as_str)
      .unwrap_or(self.default.as_str())
  }

  /// Every live collection of the area, default first, without duplicates.
  pub fn collections(&self) -> Vec<&str> {
    let mut out = vec![self.default.as_str()];
    for c in self.by_category.values() {
      if !out.contains(&c.as_str()) {
        out.push(c.as_str());
      }
    }
    out
  }
}

// ─── Columns ─────────────────────────────────────────────────────────────────

/// What a report/CSV column shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum ColumnKey {
  SubmittedAt,
  Status,
  Category,
  Score,
  Field(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
  pub key:   ColumnKey,
  /// Header text, shown verbatim in exports.
  pub label: String,
}

impl Column {
  pub fn new(key: ColumnKey, label: &str) -> Self {
    Self { key, label: label.to_owned() }
  }

  pub fn field(field: &str, label: &str) -> Self {
    Self::new(ColumnKey::Field(field.to_owned()), label)
  }
}

/// Page orientation of an area's PDF report.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Orientation {
  #[default]
  Portrait,
  Landscape,
}

// ─── FeatureArea ─────────────────────────────────────────────────────────────

/// Configuration of one feature area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureArea {
  pub name:               String,
  /// Human-readable title used in exports.
  pub title:              String,
  pub layout:             CollectionLayout,
  pub archive_collection: String,
  /// Closed category set; empty means any category is accepted.
  pub categories:         Vec<String>,
  pub default_category:   String,
  pub searchable_fields:  Vec<String>,
  pub sensitive_fields:   Vec<String>,
  /// Numeric fields averaged into the derived score.
  pub score_fields:       Vec<String>,
  pub required_fields:    Vec<String>,
  pub columns:            Vec<Column>,
  pub orientation:        Orientation,
}

impl FeatureArea {
  /// Contact-form messages: complaints, suggestions, information requests.
  /// Praise routed here is handed over to the praise collection.
  pub fn contact_messages() -> Self {
    Self {
      name:               "contato".into(),
      title:              "Mensagens de contato".into(),
      layout:             CollectionLayout::single("reclamacoes").with("Elogio", "elogios"),
      archive_collection: "reclamacoes-arquivadas".into(),
      categories:         strings(&["Elogio", "Reclamação", "Informação", "Sugestão", "Outro"]),
      default_category:   "Outro".into(),
      searchable_fields:  strings(&["nome", "email", "telefone", "assunto", "mensagem"]),
      sensitive_fields:   strings(&["nome", "telefone", "email"]),
      score_fields:       Vec::new(),
      required_fields:    strings(&["mensagem"]),
      columns:            vec![
        Column::new(ColumnKey::SubmittedAt, "Data"),
        Column::new(ColumnKey::Category, "Tipo"),
        Column::new(ColumnKey::Status, "Status"),
        Column::field("nome", "Nome"),
        Column::field("email", "E-mail"),
        Column::field("telefone", "Telefone"),
        Column::field("assunto", "Assunto"),
        Column::field("mensagem", "Mensagem"),
      ],
      orientation:        Orientation::Landscape,
    }
  }

  /// Passenger satisfaction surveys; the score is the mean of the ratings.
  pub fn satisfaction_surveys() -> Self {
    Self {
      name:               "pesquisas".into(),
      title:              "Pesquisa de satisfação".into(),
      layout:             CollectionLayout::single("pesquisa_satisfacao"),
      archive_collection: "pesquisa_satisfacao_arquivadas".into(),
      categories:         Vec::new(),
      default_category:   "Pesquisa".into(),
      searchable_fields:  strings(&["nome", "telefone", "email", "comentario", "motorista"]),
      sensitive_fields:   strings(&["nome", "telefone", "email"]),
      score_fields:       strings(&["atendimento", "pontualidade", "veiculo", "motorista_nota"]),
      required_fields:    Vec::new(),
      columns:            vec![
        Column::new(ColumnKey::SubmittedAt, "Data"),
        Column::field("nome", "Nome"),
        Column::field("telefone", "Telefone"),
        Column::field("motorista", "Motorista"),
        Column::field("atendimento", "Atendimento"),
        Column::field("pontualidade", "Pontualidade"),
        Column::field("veiculo", "Veículo"),
        Column::field("motorista_nota", "Motorista (nota)"),
        Column::new(ColumnKey::Score, "Média"),
        Column::field("comentario", "Comentário"),
      ],
      orientation:        Orientation::Landscape,
    }
  }

  /// Praise addressed to drivers.
  pub fn driver_praise() -> Self {
    Self {
      name:               "elogios".into(),
      title:              "Elogios aos motoristas".into(),
      layout:             CollectionLayout::single("elogios"),
      archive_collection: "elogios-arquivados".into(),
      categories:         strings(&["Elogio"]),
      default_category:   "Elogio".into(),
      searchable_fields:  strings(&["nome", "telefone", "email", "motorista", "mensagem"]),
      sensitive_fields:   strings(&["nome", "telefone", "email"]),
      score_fields:       Vec::new(),
      required_fields:    strings(&["mensagem"]),
      columns:            vec![
        Column::new(ColumnKey::SubmittedAt, "Data"),
        Column::new(ColumnKey::Status, "Status"),
        Column::field("motorista", "Motorista"),
        Column::field("nome", "Passageiro"),
        Column::field("telefone", "Telefone"),
        Column::field("mensagem", "Elogio"),
      ],
      orientation:        Orientation::Portrait,
    }
  }

  /// Coordination documents: minutes, incident reports, ordinances and
  /// announcements.
  pub fn coordination_documents() -> Self {
    Self {
      name:               "documentos".into(),
      title:              "Documentos da coordenação".into(),
      layout:             CollectionLayout::single("documentos")
        .with("Comunicado", "comunicados")
        .with("Portaria", "portarias"),
      archive_collection: "documentos-arquivados".into(),
      categories:         strings(&["Ata", "Ocorrência", "Portaria", "Comunicado"]),
      default_category:   "Ata".into(),
      searchable_fields:  strings(&["titulo", "autor", "conteudo", "numero"]),
      sensitive_fields:   strings(&["autor"]),
      score_fields:       Vec::new(),
      required_fields:    strings(&["titulo"]),
      columns:            vec![
        Column::new(ColumnKey::SubmittedAt, "Data"),
        Column::new(ColumnKey::Category, "Tipo"),
        Column::field("numero", "Número"),
        Column::field("titulo", "Título"),
        Column::field("autor", "Autor"),
        Column::new(ColumnKey::Status, "Status"),
      ],
      orientation:        Orientation::Portrait,
    }
  }

  /// Check `category` against the closed set (empty set accepts anything).
  pub fn validate_category(&self, category: &str) -> Result<()> {
    if self.categories.is_empty() || self.categories.iter().any(|c| c == category) {
      Ok(())
    } else {
      Err(Error::UnknownCategory {
        area:     self.name.clone(),
        category: category.to_owned(),
      })
    }
  }

  pub fn live_collection(&self, category: &str) -> &str {
    self.layout.collection_for(category)
  }

  pub fn live_collections(&self) -> Vec<&str> { self.layout.collections() }

  pub fn is_sensitive(&self, field: &str) -> bool {
    self.sensitive_fields.iter().any(|f| f == field)
  }
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| (*s).to_owned()).collect()
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The set of configured areas, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
  areas: BTreeMap<String, FeatureArea>,
}

impl AreaRegistry {
  /// The four standard D-TAXI areas.
  pub fn standard() -> Self {
    let mut registry = Self::default();
    registry.insert(FeatureArea::contact_messages());
    registry.insert(FeatureArea::satisfaction_surveys());
    registry.insert(FeatureArea::driver_praise());
    registry.insert(FeatureArea::coordination_documents());
    registry
  }

  pub fn insert(&mut self, area: FeatureArea) {
    self.areas.insert(area.name.clone(), area);
  }

  pub fn get(&self, name: &str) -> Result<&FeatureArea> {
    self
      .areas
      .get(name)
      .ok_or_else(|| Error::UnknownArea(name.to_owned()))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.areas.keys().map(String::as_str)
  }
}
