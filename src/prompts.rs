//! Registers the gateway's fixed prompt types (§ PLANNING / TOOL_REASONING /
//! RECOVERY_REASONING / FINALIZER / SYNTHESIS). Content and wording are an
//! integration detail of the deployment, not this crate's concern — these
//! templates exist so the gateway has somewhere to route each call; operators
//! are expected to tune the wording for their own tenants.

use jervis_llm::candidate_selector::ModelType;
use jervis_llm::prompt::{
    CreativityLevel, PromptRegistry, PromptTemplate, PromptType, RECOVERY_REASONING_PROMPT,
    SYNTHESIS_PROMPT,
};

use jervis_core::executor::FINALIZER_PROMPT;
use jervis_core::planner::{PLANNING_PROMPT, TOOL_REASONING_PROMPT};

/// Model-type tag used to route planning calls.
pub const PLANNING_MODEL_TYPE: &str = "planning";
/// Model-type tag used to route tool-reasoning calls.
pub const TOOL_REASONING_MODEL_TYPE: &str = "tool_reasoning";
/// Model-type tag used to route recovery-reasoning calls.
pub const RECOVERY_REASONING_MODEL_TYPE: &str = "recovery_reasoning";
/// Model-type tag used to route finalizer calls.
pub const FINALIZER_MODEL_TYPE: &str = "finalizer";
/// Model-type tag used to route RAG synthesis calls.
pub const SYNTHESIS_MODEL_TYPE: &str = "synthesis";

/// Build the registry every `Gateway` call in this process resolves against.
#[must_use]
pub fn build_prompt_registry() -> PromptRegistry {
    let mut registry = PromptRegistry::new();

    registry.register(
        PromptType::new(PLANNING_PROMPT),
        PromptTemplate {
            system: "You are the planning stage of an AI assistant. Decompose the \
                     user's request into a minimal set of dependency-ordered goals."
                .to_string(),
            user: "Question: {{english_question}}\n\nContext so far:\n{{context_summary}}\n\n\
                   Available tools:\n{{tool_catalog}}\n\n{{validation_error}}\n\n\
                   Respond with JSON: {\"goals\": [{\"goal_id\": <u32>, \"goal_intent\": <string>, \"depends_on\": [<u32>]}]}"
                .to_string(),
            model_type: ModelType::new(PLANNING_MODEL_TYPE),
            creativity: CreativityLevel::PRECISE,
            quick: false,
        },
    );

    registry.register(
        PromptType::new(TOOL_REASONING_PROMPT),
        PromptTemplate {
            system: "You select exactly one tool to satisfy a single goal and describe \
                     its natural-language parameters."
                .to_string(),
            user: "Goal: {{goal_intent}}\n\nContext so far:\n{{context_summary}}\n\n\
                   Available tools:\n{{tool_catalog}}\n\n\
                   Respond with JSON: {\"tool_name\": <string>, \"reasoning\": <string>, \"parameters\": <string>}"
                .to_string(),
            model_type: ModelType::new(TOOL_REASONING_MODEL_TYPE),
            creativity: CreativityLevel::PRECISE,
            quick: false,
        },
    );

    registry.register(
        PromptType::new(RECOVERY_REASONING_PROMPT),
        PromptTemplate {
            system: "A tool invocation failed. Choose a replacement tool invocation \
                     that works around the failure."
                .to_string(),
            user: "Failed tool: {{failed_tool}}\nError: {{error_message}}\n\
                   Original instruction: {{step_instruction}}\n\n\
                   Respond with JSON: {\"tool_name\": <string>, \"reasoning\": <string>, \"parameters\": <string>}"
                .to_string(),
            model_type: ModelType::new(RECOVERY_REASONING_MODEL_TYPE),
            creativity: CreativityLevel::PRECISE,
            quick: false,
        },
    );

    registry.register(
        PromptType::new(FINALIZER_PROMPT),
        PromptTemplate {
            system: "Synthesize the user-facing answer from a completed plan's step \
                     results. Be direct; don't mention tools or steps by name."
                .to_string(),
            user: "Original question: {{original_question}}\n\nStep results:\n{{step_results}}\n\n\
                   Respond with JSON: {\"final_answer\": <string>}"
                .to_string(),
            model_type: ModelType::new(FINALIZER_MODEL_TYPE),
            creativity: CreativityLevel::BALANCED,
            quick: false,
        },
    );

    registry.register(
        PromptType::new(SYNTHESIS_PROMPT),
        PromptTemplate {
            system: "Answer the user's query using only the provided search results. \
                     Say so plainly if they don't contain an answer."
                .to_string(),
            user: "Query: {{original_query}}\n\nContext:\n{{context_summary}}\n\n\
                   Search results:\n{{search_results}}\n\n\
                   Respond with JSON: {\"answer\": <string>}"
                .to_string(),
            model_type: ModelType::new(SYNTHESIS_MODEL_TYPE),
            creativity: CreativityLevel::BALANCED,
            quick: false,
        },
    );

    registry
}
