pub use bc_forms::control::{Control, RenderedControl, RenderedForm, RenderedView, TabStrip};
pub use bc_forms::{
    apply_change, FormDesignDetail, FormEngine, FormError, FormSearchStore, RenderContext,
    RendererRegistry, WorkflowClient,
};
pub use bc_forms_std_renderers::{register_standard_renderers, render_standard_form};
pub use bc_workflow_api::{
    Locale, PageData, ResponseEnvelope, RunWorkflowRequest, ViewRecordRequest,
};
