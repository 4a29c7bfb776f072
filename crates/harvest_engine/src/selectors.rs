use crate::driver::Locator;

/// Where things live in the remote UI. Defaults target the WhatsApp Web layout
/// with a Spanish-language interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    /// Scrollable container of the outer (conversation) list.
    pub outer_container: Locator,
    /// One conversation row inside the outer container.
    pub outer_row: Locator,
    /// Title-carrying element inside a conversation row.
    pub outer_title: Locator,
    /// Attribute holding the conversation title.
    pub title_attribute: String,

    /// Region that appears once a conversation is open.
    pub conversation_region: Locator,
    /// Scrollable message list inside the open conversation.
    pub message_scroller: Locator,
    /// Literal message element carrying the provenance attribute.
    pub message_meta: Locator,
    /// Attribute with the sender/timestamp annotation.
    pub meta_attribute: String,
    /// One message row (bubble) inside the message list.
    pub message_row: Locator,

    /// Marks a voice note or audio clip row.
    pub audio_marker: Locator,
    /// Controls that only appear on photo, document or file rows.
    pub attachment_controls: Vec<Locator>,
    /// Embedded media that marks a text-less row as an attachment.
    pub embedded_media: Locator,

    /// Notices rendered at the very start of a conversation's history.
    pub history_start_sentinels: Vec<Locator>,
    /// "Fetch older messages" prompt, most specific form first.
    pub load_older_prompts: Vec<Locator>,
}

impl Default for Selectors {
    fn default() -> Self {
        const LOAD_OLDER: &str = "Haz clic aquí para obtener mensajes anteriores";
        Self {
            outer_container: Locator::css("#pane-side"),
            outer_row: Locator::css("div[role='row']"),
            outer_title: Locator::css("span[title]"),
            title_attribute: "title".to_string(),

            conversation_region: Locator::css("div.copyable-area"),
            message_scroller: Locator::css(
                "div.copyable-area [data-scrolltracepolicy='wa.web.conversation.messages']",
            ),
            message_meta: Locator::css("[data-pre-plain-text]"),
            meta_attribute: "data-pre-plain-text".to_string(),
            message_row: Locator::css("div[role='row']"),

            audio_marker: Locator::css("[data-icon='audio-play'], [data-icon='ptt-play']"),
            attachment_controls: vec![
                Locator::css("[role='button'][aria-label*='Abrir foto']"),
                Locator::css(
                    "[role='button'][aria-label*='Descargar'], [role='button'][aria-label*='Download']",
                ),
                Locator::css("[role='button'][aria-label*='Reenviar archivo']"),
            ],
            embedded_media: Locator::css("img, video"),

            history_start_sentinels: vec![
                Locator::text("Los mensajes y las llamadas están cifrados de extremo a extremo"),
                Locator::text("Tu empresa usa un servicio seguro de Meta para administrar este chat"),
            ],
            load_older_prompts: vec![
                Locator::text_in("button", LOAD_OLDER),
                Locator::text_in("div, span", LOAD_OLDER),
            ],
        }
    }
}
