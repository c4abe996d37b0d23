use std::{sync::Arc, time::Instant};

use tracing::{info, warn};

use crate::{
    application::dtos::{AskRequest, AskResponse, SourceDto},
    domain::{DocumentRecord, DomainError, SearchOutcome},
};

use super::RetrievalService;

pub const DEFAULT_TEMPERATURE: f32 = 0.5;

const SYSTEM_INSTRUCTION: &str = "Você é um assistente especializado em contratos imobiliários com acesso a uma base de documentos. \
Suas respostas devem ser:\n\
1. DETALHADAS - Forneça informações completas e abrangentes sobre o que foi perguntado.\n\
2. ESPECÍFICAS - Quando a pergunta for sobre pessoas, entidades ou cláusulas, inclua TODOS os detalhes disponíveis nos documentos.\n\
3. ESTRUTURADAS - Organize a resposta de forma clara, usando listas ou seções quando apropriado.\n\
4. BASEADAS EM EVIDÊNCIAS - Cite explicitamente de qual documento/contrato a informação foi extraída.\n\
5. Cite explicitamente códigos de barras, caso as informações sejam de boletos de cobrança.";

const NO_DOCUMENTS: &str = "Nenhum documento relevante encontrado.";
const EMPTY_ANSWER: &str =
    "Não foi possível gerar uma resposta detalhada do modelo. Resposta vazia ou inesperada.";

/// Raw text parts and safety feedback returned by a generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub parts: Vec<String>,
    pub block_reason: Option<String>,
}

impl Generation {
    pub fn text(&self) -> Option<String> {
        let joined: String = self.parts.concat();
        (!joined.trim().is_empty()).then_some(joined)
    }
}

/// Model entry reported by the language model service.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

/// Abstraction over the external large-language-model service.
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str, temperature: f32) -> Result<Generation, DomainError>;

    fn list_models(&self) -> Result<Vec<ModelInfo>, DomainError>;
}

/// Answers questions from retrieved contract excerpts.
pub struct AnswerService {
    retrieval: Arc<RetrievalService>,
    model: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl AnswerService {
    pub fn new(retrieval: Arc<RetrievalService>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            retrieval,
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    pub fn ask(&self, request: AskRequest) -> Result<AskResponse, DomainError> {
        let started = Instant::now();
        let question = request.question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("question cannot be empty"));
        }

        info!(max_results = request.max_results, "question received");

        let documents = match self.retrieval.search(question, request.max_results)? {
            SearchOutcome::Found(documents) => documents,
            SearchOutcome::Empty => return Err(DomainError::not_found(NO_DOCUMENTS)),
            SearchOutcome::Failed { reason } => {
                return Err(DomainError::search(format!(
                    "failed to process the search query: {reason}"
                )))
            }
        };
        info!(documents = documents.len(), "relevant documents found");

        let prompt = build_prompt(question, &documents);
        info!(model = self.model.model_name(), "generating answer");
        let generation = self.model.generate(&prompt, self.temperature)?;
        let answer = resolve_answer(generation);

        let sources = documents
            .into_iter()
            .map(|doc| SourceDto {
                filename: doc.file_name,
                text: doc.text,
            })
            .collect();

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "answer generated"
        );
        Ok(AskResponse { answer, sources })
    }

    /// Models that can serve `generateContent` requests.
    pub fn generation_models(&self) -> Result<Vec<ModelInfo>, DomainError> {
        Ok(self
            .model
            .list_models()?
            .into_iter()
            .filter(|m| m.supports("generateContent"))
            .collect())
    }
}

/// Numbered excerpt blocks separated by blank lines.
pub fn build_context(documents: &[DocumentRecord]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Documento {} - {}]\n{}", i + 1, doc.file_name, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, documents: &[DocumentRecord]) -> String {
    format!(
        "{SYSTEM_INSTRUCTION}\n\nDocumentos:\n{}\n\nPergunta: {question}",
        build_context(documents)
    )
}

fn resolve_answer(generation: Generation) -> String {
    if let Some(text) = generation.text() {
        return text;
    }
    match generation.block_reason {
        Some(reason) => {
            warn!(reason = %reason, "generation blocked by safety filters");
            format!(
                "A resposta não pôde ser gerada devido a filtros de segurança do modelo. Motivo: {reason}"
            )
        }
        None => {
            warn!("model returned an empty or unexpected response");
            EMPTY_ANSWER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::application::services::{
        retrieval_service::tests::{service_with, RecordingEmbedder},
        vector_gateway::tests::{document_match, FakeIndex, FakeStore},
    };

    struct ScriptedModel {
        reply: Result<Generation, String>,
        prompts: Mutex<Vec<(String, f32)>>,
    }

    impl ScriptedModel {
        fn replying(generation: Generation) -> Self {
            Self {
                reply: Ok(generation),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "models/scripted"
        }

        fn generate(&self, prompt: &str, temperature: f32) -> Result<Generation, DomainError> {
            self.prompts.lock().push((prompt.to_string(), temperature));
            self.reply.clone().map_err(DomainError::generation)
        }

        fn list_models(&self) -> Result<Vec<ModelInfo>, DomainError> {
            Ok(vec![
                ModelInfo {
                    name: "models/gemini-1.5-flash".into(),
                    supported_generation_methods: vec!["generateContent".into()],
                },
                ModelInfo {
                    name: "models/embedding-001".into(),
                    supported_generation_methods: vec!["embedContent".into()],
                },
            ])
        }
    }

    fn answer_service(matches: usize, model: Arc<ScriptedModel>) -> AnswerService {
        let store = Arc::new(FakeStore::new(FakeIndex {
            total: matches as u64,
            matches: (0..matches)
                .map(|i| document_match(&format!("doc{i}"), 0.9))
                .collect(),
            ..Default::default()
        }));
        let retrieval = service_with(Arc::new(RecordingEmbedder::default()), store);
        AnswerService::new(Arc::new(retrieval), model)
    }

    fn ask(question: &str) -> AskRequest {
        AskRequest {
            question: question.into(),
            max_results: 50,
        }
    }

    #[test]
    fn prompt_numbers_documents_and_ends_with_question() {
        let model = Arc::new(ScriptedModel::replying(Generation {
            parts: vec!["O aluguel é ".into(), "R$ 1.500,00.".into()],
            block_reason: None,
        }));
        let service = answer_service(2, Arc::clone(&model));

        let response = service.ask(ask("qual o valor do aluguel?")).expect("answer");
        assert_eq!(response.answer, "O aluguel é R$ 1.500,00.");
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].filename, "doc0.pdf");

        let prompts = model.prompts.lock();
        let (prompt, temperature) = &prompts[0];
        assert!(prompt.starts_with("Você é um assistente especializado"));
        assert!(prompt.contains("[Documento 1 - doc0.pdf]\nconteúdo doc0\n\n[Documento 2 - doc1.pdf]"));
        assert!(prompt.ends_with("Pergunta: qual o valor do aluguel?"));
        assert_eq!(*temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn blank_question_is_rejected() {
        let service = answer_service(1, Arc::new(ScriptedModel::replying(Generation::default())));
        assert!(matches!(service.ask(ask("  ")), Err(DomainError::Validation(_))));
    }

    #[test]
    fn no_documents_is_not_found() {
        let model = Arc::new(ScriptedModel::replying(Generation::default()));
        let service = answer_service(0, Arc::clone(&model));
        assert!(matches!(service.ask(ask("prazo")), Err(DomainError::NotFound(_))));
        assert!(model.prompts.lock().is_empty());
    }

    #[test]
    fn blocked_generation_reports_reason() {
        let service = answer_service(
            1,
            Arc::new(ScriptedModel::replying(Generation {
                parts: Vec::new(),
                block_reason: Some("SAFETY".into()),
            })),
        );
        let response = service.ask(ask("prazo")).expect("answer");
        assert!(response.answer.ends_with("Motivo: SAFETY"));
    }

    #[test]
    fn empty_generation_falls_back_to_notice() {
        let service = answer_service(1, Arc::new(ScriptedModel::replying(Generation::default())));
        assert_eq!(service.ask(ask("prazo")).expect("answer").answer, EMPTY_ANSWER);
    }

    #[test]
    fn generation_failure_propagates() {
        let model = Arc::new(ScriptedModel {
            reply: Err("quota exceeded".into()),
            prompts: Mutex::new(Vec::new()),
        });
        let service = answer_service(1, model);
        assert!(matches!(service.ask(ask("prazo")), Err(DomainError::Generation(_))));
    }

    #[test]
    fn lists_only_generation_capable_models() {
        let service = answer_service(1, Arc::new(ScriptedModel::replying(Generation::default())));
        let models = service.generation_models().expect("models");
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].name, "models/gemini-1.5-flash");
    }
}
