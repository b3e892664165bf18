// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::middleware::i18n::Locale;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const SUPPORTED_LANGUAGES: [&str; 3] = ["en", "es", "pt"];

// ---
// Catálogo de mensagens (chave -> texto), um por idioma.
// Parâmetros usam a forma {nome}.
// ---
const EN: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.malformed_request", "The request could not be read: check the JSON body and query parameters."),
    ("error.quantity.not_positive", "The quantity must be greater than zero."),
    ("error.quantity.negative", "The quantity cannot be negative."),
    ("error.quantity.fractional", "Tools are counted in whole units."),
    ("error.quantity.out_of_range", "The quantity is out of range."),
    ("error.quantity.insufficient", "Insufficient stock: available {available}, requested {requested}."),
    ("error.invalid_date", "Invalid date '{value}'. Use YYYY-MM-DD or an RFC 3339 timestamp."),
    ("error.invalid_date_range", "The start date must not be after the end date."),
    ("error.invalid_item_kind", "Unknown item kind '{value}'. Use 'supply' or 'tool'."),
    ("error.supply_not_found", "Supply '{key}' not found."),
    ("error.tool_not_found", "Tool '{key}' not found."),
    ("error.duplicate_supply", "A supply named '{name}' already exists."),
    ("error.duplicate_tool", "A tool named '{name}' already exists."),
    ("error.insufficient_stock", "Insufficient stock for '{name}': available {available}, requested {requested}."),
    ("error.storage_unavailable", "The storage is temporarily unavailable. Please try again."),
    ("error.internal", "An unexpected error occurred."),
    ("supply.created", "Supply created successfully."),
    ("supply.updated", "Supply updated successfully."),
    ("supply.deleted", "Supply deleted successfully."),
    ("tool.created", "Tool created successfully."),
    ("tool.updated", "Tool updated successfully."),
    ("tool.deleted", "Tool deleted successfully."),
    ("movement.recorded", "Movement recorded successfully."),
];

const ES: &[(&str, &str)] = &[
    ("error.validation", "Uno o más campos son inválidos."),
    ("error.malformed_request", "No se pudo leer la solicitud: revise el cuerpo JSON y los parámetros."),
    ("error.quantity.not_positive", "La cantidad debe ser mayor que cero."),
    ("error.quantity.negative", "La cantidad no puede ser negativa."),
    ("error.quantity.fractional", "Las herramientas se cuentan en unidades enteras."),
    ("error.quantity.out_of_range", "La cantidad está fuera de rango."),
    ("error.quantity.insufficient", "No hay suficiente stock: disponible {available}, solicitado {requested}."),
    ("error.invalid_date", "Fecha inválida '{value}'. Use AAAA-MM-DD o una marca de tiempo RFC 3339."),
    ("error.invalid_date_range", "La fecha de inicio no puede ser posterior a la fecha de término."),
    ("error.invalid_item_kind", "Tipo de item desconocido '{value}'. Use 'supply' o 'tool'."),
    ("error.supply_not_found", "Insumo '{key}' no encontrado."),
    ("error.tool_not_found", "Herramienta '{key}' no encontrada."),
    ("error.duplicate_supply", "Ya existe un insumo llamado '{name}'."),
    ("error.duplicate_tool", "Ya existe una herramienta llamada '{name}'."),
    ("error.insufficient_stock", "No hay suficiente stock de '{name}': disponible {available}, solicitado {requested}."),
    ("error.storage_unavailable", "El almacenamiento no está disponible por ahora. Intente nuevamente."),
    ("error.internal", "Error interno del servidor."),
    ("supply.created", "Insumo creado exitosamente."),
    ("supply.updated", "Insumo actualizado exitosamente."),
    ("supply.deleted", "Insumo eliminado exitosamente."),
    ("tool.created", "Herramienta creada exitosamente."),
    ("tool.updated", "Herramienta actualizada exitosamente."),
    ("tool.deleted", "Herramienta eliminada exitosamente."),
    ("movement.recorded", "Movimiento registrado exitosamente."),
];

const PT: &[(&str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos."),
    ("error.malformed_request", "Não foi possível ler a requisição: verifique o corpo JSON e os parâmetros."),
    ("error.quantity.not_positive", "A quantidade deve ser maior que zero."),
    ("error.quantity.negative", "A quantidade não pode ser negativa."),
    ("error.quantity.fractional", "Ferramentas são contadas em unidades inteiras."),
    ("error.quantity.out_of_range", "A quantidade está fora do intervalo permitido."),
    ("error.quantity.insufficient", "Estoque insuficiente: disponível {available}, solicitado {requested}."),
    ("error.invalid_date", "Data inválida '{value}'. Use AAAA-MM-DD ou um timestamp RFC 3339."),
    ("error.invalid_date_range", "A data inicial não pode ser posterior à data final."),
    ("error.invalid_item_kind", "Tipo de item desconhecido '{value}'. Use 'supply' ou 'tool'."),
    ("error.supply_not_found", "Insumo '{key}' não encontrado."),
    ("error.tool_not_found", "Ferramenta '{key}' não encontrada."),
    ("error.duplicate_supply", "Já existe um insumo chamado '{name}'."),
    ("error.duplicate_tool", "Já existe uma ferramenta chamada '{name}'."),
    ("error.insufficient_stock", "Estoque insuficiente de '{name}': disponível {available}, solicitado {requested}."),
    ("error.storage_unavailable", "O armazenamento está indisponível no momento. Tente novamente."),
    ("error.internal", "Ocorreu um erro inesperado."),
    ("supply.created", "Insumo criado com sucesso."),
    ("supply.updated", "Insumo atualizado com sucesso."),
    ("supply.deleted", "Insumo excluído com sucesso."),
    ("tool.created", "Ferramenta criada com sucesso."),
    ("tool.updated", "Ferramenta atualizada com sucesso."),
    ("tool.deleted", "Ferramenta excluída com sucesso."),
    ("movement.recorded", "Movimento registrado com sucesso."),
];

#[derive(Clone)]
pub struct I18nStore {
    catalog: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
    // Fora de produção, as respostas de erro levam o detalhe técnico
    expose_error_details: bool,
}

impl I18nStore {
    pub fn new(expose_error_details: bool) -> Self {
        let catalog = [("en", EN), ("es", ES), ("pt", PT)]
            .into_iter()
            .map(|(lang, entries)| (lang, entries.iter().copied().collect()))
            .collect();

        Self { catalog: Arc::new(catalog), expose_error_details }
    }

    pub fn expose_error_details(&self) -> bool {
        self.expose_error_details
    }

    /// Busca a mensagem no idioma pedido, caindo para inglês e por fim para a chave.
    pub fn message(&self, locale: &Locale, key: &str) -> String {
        self.lookup(&locale.0, key)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, key))
            .unwrap_or(key)
            .to_string()
    }

    pub fn format(&self, locale: &Locale, key: &str, args: &[(&str, String)]) -> String {
        args.iter().fold(self.message(locale, key), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.catalog.get(lang).and_then(|messages| messages.get(key)).copied()
    }
}
