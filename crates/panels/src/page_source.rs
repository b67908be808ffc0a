use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::Embed;

/// Produces pages on demand for collections too large to pre-render.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Record: Send;

    /// Total page count. Called once when the panel is built, so keep it cheap.
    fn max_pages(&self) -> usize;

    /// Record backing the 0-based page `index`, `None` when out of range.
    async fn get_page(&self, index: usize) -> Result<Option<Self::Record>>;

    fn format_page(&self, record: Self::Record) -> Embed;
}

#[async_trait]
trait RenderPage: Send + Sync {
    fn page_count(&self) -> usize;
    async fn render(&self, index: usize) -> Result<Option<Embed>>;
}

#[async_trait]
impl<S> RenderPage for S
where
    S: PageSource,
{
    fn page_count(&self) -> usize {
        self.max_pages()
    }

    async fn render(&self, index: usize) -> Result<Option<Embed>> {
        Ok(self
            .get_page(index)
            .await?
            .map(|record| self.format_page(record)))
    }
}

enum Backing {
    Static(Vec<Embed>),
    Source(Box<dyn RenderPage>),
}

/// What a panel pages through: either a pre-built list or a lazy source, never both.
pub struct Pages {
    backing: Backing,
}

impl Pages {
    pub fn from_embeds(embeds: Vec<Embed>) -> Self {
        Self {
            backing: Backing::Static(embeds),
        }
    }

    pub fn from_source<S>(source: S) -> Self
    where
        S: PageSource + 'static,
    {
        Self {
            backing: Backing::Source(Box::new(source)),
        }
    }

    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::Static(embeds) => embeds.len(),
            Backing::Source(source) => source.page_count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.backing, Backing::Source(_))
    }

    pub async fn render(&self, index: usize) -> Result<Option<Embed>> {
        match &self.backing {
            Backing::Static(embeds) => Ok(embeds.get(index).cloned()),
            Backing::Source(source) => source.render(index).await,
        }
    }

    /// Writes `embed` back over a pre-built page. Lazy pages are regenerated on every render,
    /// so there is nothing to overwrite.
    pub fn store(&mut self, index: usize, embed: Embed) {
        if let Backing::Static(embeds) = &mut self.backing {
            if let Some(slot) = embeds.get_mut(index) {
                *slot = embed;
            }
        }
    }

    pub(crate) fn for_each_static<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &mut Embed),
    {
        if let Backing::Static(embeds) = &mut self.backing {
            for (idx, embed) in embeds.iter_mut().enumerate() {
                f(idx, embed);
            }
        }
    }
}

impl std::fmt::Debug for Pages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("lazy", &self.is_lazy())
            .field("len", &self.len())
            .finish()
    }
}
