//! Application layer wiring DTOs and services for contract retrieval.

pub mod dtos;
pub mod services;

pub use dtos::{
    AskRequest, AskResponse, DocumentListResponse, HealthStatusResponse, IndexDocumentRequest,
    IndexDocumentResponse, SearchRequest, SearchResponse, SourceDto,
};
pub use services::{AnswerService, RetrievalService};
