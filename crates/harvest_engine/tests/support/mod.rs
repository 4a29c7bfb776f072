//! In-memory stand-in for the remote UI: a virtualized outer list of titled rows and
//! a virtualized message list per conversation that loads older history lazily.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::Record;
use harvest_engine::{
    DriverError, ElementHandle, Locator, PersistError, RecordSink, RunConfig, ScrollMetrics,
    Selectors, UiDriver,
};

pub const ROW_HEIGHT: f64 = 100.0;
pub const OUTER_VISIBLE_ROWS: usize = 4;
pub const CHAT_VISIBLE_ROWS: usize = 3;
/// Rows kept rendered above and below the viewport of a message list.
pub const RENDER_BUFFER: usize = 10;
pub const BANNER_TEXT: &str = "Los mensajes y las llamadas están cifrados de extremo a extremo.";

/// Defaults with the outer step shorter than one screen of rows, so no label is
/// skipped between rounds.
pub fn test_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.pager.step = (OUTER_VISIBLE_ROWS - 1) as f64 * ROW_HEIGHT;
    config.output_name = "all_chats".to_string();
    config
}

pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    /// Voice note; the string is the visible duration.
    Audio(String),
    Photo,
    Document(String),
    ImageOnly,
}

#[derive(Debug, Clone)]
pub struct FakeMessage {
    pub meta: Option<String>,
    pub body: Body,
}

impl FakeMessage {
    pub fn text(meta: &str, text: &str) -> Self {
        Self {
            meta: Some(meta.to_string()),
            body: Body::Text(text.to_string()),
        }
    }

    pub fn audio(duration: &str) -> Self {
        Self {
            meta: None,
            body: Body::Audio(duration.to_string()),
        }
    }

    pub fn photo() -> Self {
        Self {
            meta: None,
            body: Body::Photo,
        }
    }

    pub fn document(name: &str) -> Self {
        Self {
            meta: None,
            body: Body::Document(name.to_string()),
        }
    }

    pub fn image_only() -> Self {
        Self {
            meta: None,
            body: Body::ImageOnly,
        }
    }

    fn row_text(&self) -> String {
        match &self.body {
            Body::Text(text) => text.clone(),
            Body::Audio(duration) => duration.clone(),
            Body::Document(name) => name.clone(),
            Body::Photo | Body::ImageOnly => String::new(),
        }
    }
}

/// `count` distinct text messages whose meta starts with `prefix`.
pub fn texts(prefix: &str, count: usize) -> Vec<FakeMessage> {
    (0..count)
        .map(|i| FakeMessage::text(&format!("[10:{i:02}, 3/4/2024] {prefix}: "), &format!("{prefix} {i}")))
        .collect()
}

#[derive(Debug, Clone)]
pub struct FakeChat {
    renders: bool,
    banner: bool,
    loaded: Vec<FakeMessage>,
    lazy_older: VecDeque<Vec<FakeMessage>>,
    prompt_older: VecDeque<Vec<FakeMessage>>,
}

impl FakeChat {
    /// A conversation whose whole history is already loaded, oldest first, with
    /// the history-start notice above it.
    pub fn new(messages: Vec<FakeMessage>) -> Self {
        Self {
            renders: true,
            banner: true,
            loaded: messages,
            lazy_older: VecDeque::new(),
            prompt_older: VecDeque::new(),
        }
    }

    pub fn without_banner(mut self) -> Self {
        self.banner = false;
        self
    }

    /// Batches that appear on their own once the list sits at the top, nearest
    /// batch first.
    pub fn with_lazy_older(mut self, batches: Vec<Vec<FakeMessage>>) -> Self {
        self.lazy_older = batches.into();
        self
    }

    /// Batches that only appear after clicking the load-more prompt.
    pub fn with_prompt_older(mut self, batches: Vec<Vec<FakeMessage>>) -> Self {
        self.prompt_older = batches.into();
        self
    }

    pub fn not_rendering(mut self) -> Self {
        self.renders = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    OuterContainer,
    OuterRow(usize),
    OuterTitle(usize),
    Region,
    Scroller,
    Row(u64),
    Meta(u64),
    AudioIcon(u64),
    PhotoButton(u64),
    DownloadButton(u64),
    Media(u64),
    Banner,
    Prompt,
}

struct OpenChat {
    chat: FakeChat,
    loaded: Vec<(u64, FakeMessage)>,
    top: f64,
}

impl OpenChat {
    fn client_height(&self) -> f64 {
        CHAT_VISIBLE_ROWS as f64 * ROW_HEIGHT
    }

    fn scroll_height(&self) -> f64 {
        (self.loaded.len() as f64 * ROW_HEIGHT).max(self.client_height())
    }

    fn clamp_top(&mut self) {
        let max = self.scroll_height() - self.client_height();
        self.top = self.top.clamp(0.0, max);
    }

    fn visible(&self) -> impl Iterator<Item = &(u64, FakeMessage)> {
        let first = ((self.top / ROW_HEIGHT).floor() as usize).saturating_sub(RENDER_BUFFER);
        let last = ((self.top + self.client_height()) / ROW_HEIGHT).ceil() as usize + RENDER_BUFFER;
        self.loaded
            .iter()
            .skip(first)
            .take(last.saturating_sub(first))
    }

    fn message(&self, serial: u64) -> Option<&FakeMessage> {
        self.visible()
            .find(|(s, _)| *s == serial)
            .map(|(_, message)| message)
    }

    fn near_top(&self) -> bool {
        self.top <= ROW_HEIGHT
    }

    fn banner_visible(&self) -> bool {
        self.chat.banner
            && self.chat.lazy_older.is_empty()
            && self.chat.prompt_older.is_empty()
            && self.near_top()
    }

    fn prompt_visible(&self) -> bool {
        self.chat.lazy_older.is_empty() && !self.chat.prompt_older.is_empty() && self.near_top()
    }
}

struct Inner {
    outer_ready: bool,
    labels: Vec<String>,
    outer_top: f64,
    chats: HashMap<String, FakeChat>,
    open: Option<OpenChat>,
    next_serial: u64,
    nodes: Vec<Node>,
    ids: HashMap<Node, u64>,
    opened: Vec<String>,
    prompt_clicks: usize,
    /// The outer list stops rendering once this many conversations were opened.
    outer_lost_after: Option<usize>,
}

impl Inner {
    fn handle(&mut self, node: Node) -> ElementHandle {
        if let Some(id) = self.ids.get(&node) {
            return ElementHandle::new(*id);
        }
        let id = self.nodes.len() as u64;
        self.nodes.push(node);
        self.ids.insert(node, id);
        ElementHandle::new(id)
    }

    fn live_node(&self, handle: ElementHandle) -> Result<Node, DriverError> {
        let node = self
            .nodes
            .get(handle.id() as usize)
            .copied()
            .ok_or_else(|| DriverError::Protocol(format!("unknown handle {}", handle.id())))?;
        if self.is_live(node) {
            Ok(node)
        } else {
            Err(DriverError::Stale(handle.id()))
        }
    }

    fn is_live(&self, node: Node) -> bool {
        match node {
            Node::OuterContainer => self.outer_ready,
            Node::OuterRow(i) | Node::OuterTitle(i) => {
                self.outer_ready && self.visible_outer().contains(&i)
            }
            Node::Region | Node::Scroller => self.rendering_chat().is_some(),
            Node::Row(s)
            | Node::Meta(s)
            | Node::AudioIcon(s)
            | Node::PhotoButton(s)
            | Node::DownloadButton(s)
            | Node::Media(s) => self
                .rendering_chat()
                .is_some_and(|open| open.message(s).is_some()),
            Node::Banner => self.rendering_chat().is_some_and(OpenChat::banner_visible),
            Node::Prompt => self.rendering_chat().is_some_and(OpenChat::prompt_visible),
        }
    }

    fn rendering_chat(&self) -> Option<&OpenChat> {
        self.open.as_ref().filter(|open| open.chat.renders)
    }

    fn outer_client_height(&self) -> f64 {
        OUTER_VISIBLE_ROWS as f64 * ROW_HEIGHT
    }

    fn outer_scroll_height(&self) -> f64 {
        (self.labels.len() as f64 * ROW_HEIGHT).max(self.outer_client_height())
    }

    fn visible_outer(&self) -> Vec<usize> {
        let first = (self.outer_top / ROW_HEIGHT).floor() as usize;
        (first..first + OUTER_VISIBLE_ROWS)
            .filter(|i| *i < self.labels.len())
            .collect()
    }

    fn assign(&mut self, batch: Vec<FakeMessage>) -> Vec<(u64, FakeMessage)> {
        batch
            .into_iter()
            .map(|message| {
                self.next_serial += 1;
                (self.next_serial, message)
            })
            .collect()
    }

    fn open_chat(&mut self, label: &str) {
        let chat = self
            .chats
            .get(label)
            .cloned()
            .unwrap_or_else(|| FakeChat::new(Vec::new()));
        let loaded = self.assign(chat.loaded.clone());
        let mut open = OpenChat {
            chat,
            loaded,
            top: f64::MAX,
        };
        open.clamp_top();
        self.open = Some(open);
        self.opened.push(label.to_string());
        if self.outer_lost_after.is_some_and(|limit| self.opened.len() >= limit) {
            self.outer_ready = false;
        }
    }

    fn prepend(&mut self, batch: Vec<FakeMessage>) {
        let mut fresh = self.assign(batch);
        if let Some(open) = self.open.as_mut() {
            open.top += fresh.len() as f64 * ROW_HEIGHT;
            fresh.append(&mut open.loaded);
            open.loaded = fresh;
            open.clamp_top();
        }
    }

    /// Older history arrives on its own while the list rests at the top.
    fn materialize(&mut self) {
        let batch = match self.open.as_mut() {
            Some(open) if open.chat.renders && open.top <= 5.0 => open.chat.lazy_older.pop_front(),
            _ => None,
        };
        if let Some(batch) = batch {
            self.prepend(batch);
        }
    }

    fn matches(&self, selectors: &Selectors, scope: Option<Node>, locator: &Locator) -> Vec<Node> {
        let s = selectors;
        match scope {
            None => {
                if *locator == s.outer_container && self.outer_ready {
                    vec![Node::OuterContainer]
                } else if *locator == s.conversation_region && self.rendering_chat().is_some() {
                    vec![Node::Region]
                } else if *locator == s.message_scroller && self.rendering_chat().is_some() {
                    vec![Node::Scroller]
                } else if s.load_older_prompts.contains(locator)
                    && self.rendering_chat().is_some_and(OpenChat::prompt_visible)
                {
                    vec![Node::Prompt]
                } else {
                    Vec::new()
                }
            }
            Some(Node::OuterContainer) if *locator == s.outer_row => {
                self.visible_outer().into_iter().map(Node::OuterRow).collect()
            }
            Some(Node::OuterRow(i)) if *locator == s.outer_title => {
                if self.labels[i].is_empty() {
                    Vec::new()
                } else {
                    vec![Node::OuterTitle(i)]
                }
            }
            Some(Node::Scroller) => {
                let Some(open) = self.rendering_chat() else {
                    return Vec::new();
                };
                if *locator == s.message_meta {
                    open.visible()
                        .filter(|(_, message)| message.meta.is_some())
                        .map(|(serial, _)| Node::Meta(*serial))
                        .collect()
                } else if *locator == s.message_row {
                    open.visible().map(|(serial, _)| Node::Row(*serial)).collect()
                } else if s.history_start_sentinels.contains(locator) && open.banner_visible() {
                    vec![Node::Banner]
                } else {
                    Vec::new()
                }
            }
            Some(Node::Row(serial)) => {
                let Some(message) = self.rendering_chat().and_then(|open| open.message(serial))
                else {
                    return Vec::new();
                };
                let node = if *locator == s.message_meta && message.meta.is_some() {
                    Some(Node::Meta(serial))
                } else if *locator == s.audio_marker && matches!(message.body, Body::Audio(_)) {
                    Some(Node::AudioIcon(serial))
                } else if s.attachment_controls.first() == Some(locator)
                    && message.body == Body::Photo
                {
                    Some(Node::PhotoButton(serial))
                } else if s.attachment_controls.get(1) == Some(locator)
                    && matches!(message.body, Body::Document(_))
                {
                    Some(Node::DownloadButton(serial))
                } else if *locator == s.embedded_media
                    && matches!(message.body, Body::Photo | Body::ImageOnly)
                {
                    Some(Node::Media(serial))
                } else {
                    None
                };
                node.into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

pub struct FakeUi {
    selectors: Selectors,
    inner: Mutex<Inner>,
}

impl FakeUi {
    /// Outer list with the given row titles, top to bottom. An empty title renders
    /// a row without a title element.
    pub fn new(labels: &[&str]) -> Self {
        Self {
            selectors: Selectors::default(),
            inner: Mutex::new(Inner {
                outer_ready: true,
                labels: labels.iter().map(|label| label.to_string()).collect(),
                outer_top: 0.0,
                chats: HashMap::new(),
                open: None,
                next_serial: 0,
                nodes: Vec::new(),
                ids: HashMap::new(),
                opened: Vec::new(),
                prompt_clicks: 0,
                outer_lost_after: None,
            }),
        }
    }

    pub fn with_chat(self, label: &str, chat: FakeChat) -> Self {
        self.lock().chats.insert(label.to_string(), chat);
        self
    }

    pub fn without_outer_list(self) -> Self {
        self.lock().outer_ready = false;
        self
    }

    pub fn losing_outer_list_after(self, opened: usize) -> Self {
        self.lock().outer_lost_after = Some(opened);
        self
    }

    pub fn open_chat(&self, label: &str) {
        self.lock().open_chat(label);
    }

    /// Labels in the order their conversations were opened.
    pub fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    pub fn prompt_clicks(&self) -> usize {
        self.lock().prompt_clicks
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl UiDriver for FakeUi {
    async fn find_all(
        &self,
        scope: Option<ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, DriverError> {
        let mut inner = self.lock();
        inner.materialize();
        let scope = match scope {
            Some(handle) => Some(inner.live_node(handle)?),
            None => None,
        };
        let found = inner.matches(&self.selectors, scope, locator);
        Ok(found.into_iter().map(|node| inner.handle(node)).collect())
    }

    async fn attribute(
        &self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let inner = self.lock();
        let value = match inner.live_node(element)? {
            Node::OuterTitle(i) if name == self.selectors.title_attribute => {
                Some(inner.labels[i].clone())
            }
            Node::Meta(serial) if name == self.selectors.meta_attribute => inner
                .rendering_chat()
                .and_then(|open| open.message(serial))
                .and_then(|message| message.meta.clone()),
            _ => None,
        };
        Ok(value)
    }

    async fn text(&self, element: ElementHandle) -> Result<String, DriverError> {
        let inner = self.lock();
        let text = match inner.live_node(element)? {
            Node::OuterTitle(i) => inner.labels[i].clone(),
            Node::Meta(serial) => match inner.rendering_chat().and_then(|open| open.message(serial)) {
                Some(FakeMessage {
                    body: Body::Text(text),
                    ..
                }) => text.clone(),
                _ => String::new(),
            },
            Node::Row(serial) => inner
                .rendering_chat()
                .and_then(|open| open.message(serial))
                .map(FakeMessage::row_text)
                .unwrap_or_default(),
            Node::Banner => BANNER_TEXT.to_string(),
            Node::Prompt => "Haz clic aquí para obtener mensajes anteriores de tu teléfono.".to_string(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn scroll_metrics(&self, element: ElementHandle) -> Result<ScrollMetrics, DriverError> {
        let mut inner = self.lock();
        inner.materialize();
        match inner.live_node(element)? {
            Node::OuterContainer => Ok(ScrollMetrics {
                scroll_top: inner.outer_top,
                scroll_height: inner.outer_scroll_height(),
                client_height: inner.outer_client_height(),
            }),
            Node::Scroller => {
                let open = inner
                    .rendering_chat()
                    .ok_or_else(|| DriverError::Stale(element.id()))?;
                Ok(ScrollMetrics {
                    scroll_top: open.top,
                    scroll_height: open.scroll_height(),
                    client_height: open.client_height(),
                })
            }
            _ => Ok(ScrollMetrics {
                scroll_top: 0.0,
                scroll_height: ROW_HEIGHT,
                client_height: ROW_HEIGHT,
            }),
        }
    }

    async fn set_scroll_top(&self, element: ElementHandle, top: f64) -> Result<(), DriverError> {
        let mut inner = self.lock();
        match inner.live_node(element)? {
            Node::OuterContainer => {
                let max = inner.outer_scroll_height() - inner.outer_client_height();
                inner.outer_top = top.clamp(0.0, max);
            }
            Node::Scroller => {
                if let Some(open) = inner.open.as_mut() {
                    open.top = top;
                    open.clamp_top();
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: ElementHandle) -> Result<(), DriverError> {
        self.lock().live_node(element).map(|_| ())
    }

    async fn click(&self, element: ElementHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        match inner.live_node(element)? {
            Node::OuterTitle(i) => {
                let label = inner.labels[i].trim().to_string();
                inner.open_chat(&label);
            }
            Node::Prompt => {
                let batch = inner
                    .open
                    .as_mut()
                    .and_then(|open| open.chat.prompt_older.pop_front());
                if let Some(batch) = batch {
                    inner.prompt_clicks += 1;
                    inner.prepend(batch);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Sink that keeps every write in memory.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(String, Vec<Record>)>>,
}

impl RecordingSink {
    pub fn writes(&self) -> Vec<(String, Vec<Record>)> {
        self.writes.lock().unwrap().clone()
    }
}

impl RecordSink for RecordingSink {
    fn persist(&self, name: &str, records: &[Record]) -> Result<PathBuf, PersistError> {
        self.writes
            .lock()
            .unwrap()
            .push((name.to_string(), records.to_vec()));
        Ok(PathBuf::from(format!("{name}.csv")))
    }
}

/// Sink whose destination is never writable.
pub struct FailingSink;

impl RecordSink for FailingSink {
    fn persist(&self, _name: &str, _records: &[Record]) -> Result<PathBuf, PersistError> {
        Err(PersistError::OutputDir {
            dir: PathBuf::from("/exports"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume"),
        })
    }
}

pub fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}
