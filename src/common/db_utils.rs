// src/common/db_utils.rs

use crate::common::error::AppError;
use crate::models::item::ItemKind;

// ---
// Helpers compartilhados pelos repositórios Postgres
// ---

/// Violação do índice único de nome vira 409; o resto segue como erro de banco.
pub(crate) fn map_unique_violation(e: sqlx::Error, kind: ItemKind, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::DuplicateName { kind, name: name.to_string() };
        }
    }
    e.into()
}

/// Monta o padrão do ILIKE escapando os curingas digitados pelo usuário.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
