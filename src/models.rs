/// Backend identifier of the one image-generation model. Every other catalog
/// entry is a text model.
pub const IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell-Free";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Text,
    Image,
}

/// One selectable model: the label shown in the menu and the backend id sent
/// to the inference API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub label: &'static str,
    pub backend_id: &'static str,
}

impl ModelEntry {
    pub fn kind(&self) -> ModelKind {
        kind_of(self.backend_id)
    }
}

/// Kind of the model behind a backend id: the one image model generates
/// images, everything else (including ids no longer in the catalog) is text.
pub fn kind_of(backend_id: &str) -> ModelKind {
    if backend_id == IMAGE_MODEL {
        ModelKind::Image
    } else {
        ModelKind::Text
    }
}

/// Fixed model catalog. Declaration order is the on-screen menu order and
/// must stay stable.
const CATALOG: &[ModelEntry] = &[
    ModelEntry {
        label: "Meta Llama 3.3 70B Instruct Turbo Free",
        backend_id: "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free",
    },
    ModelEntry {
        label: "Meta Llama Vision Free",
        backend_id: "meta-llama/Llama-Vision-Free",
    },
    ModelEntry {
        label: "DeepSeek R1 Distill Llama 70B Free",
        backend_id: "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free",
    },
    ModelEntry {
        label: "FLUX.1 Schnell Free",
        backend_id: IMAGE_MODEL,
    },
];

const DEFAULT_LABEL: &str = "DeepSeek R1 Distill Llama 70B Free";

pub fn catalog() -> &'static [ModelEntry] {
    CATALOG
}

pub fn resolve(label: &str) -> Option<&'static ModelEntry> {
    CATALOG.iter().find(|entry| entry.label == label)
}

/// The entry used whenever a user has not selected a model yet.
pub fn default_entry() -> &'static ModelEntry {
    CATALOG
        .iter()
        .find(|entry| entry.label == DEFAULT_LABEL)
        .unwrap_or(&CATALOG[0])
}
