//! Cursor-ordered draining of one resource category.
//!
//! [`Paginator::drain`] returns a [`Drain`]: a finite, lazy, non-restartable sequence of
//! [`Item`]s. Pages are fetched strictly one after another because each request carries
//! the cursor returned by the previous page. Before every page after the first the drain
//! sleeps for the configured pacing delay; the sleep yields to the runtime, so other
//! drains keep making progress meanwhile. The first failing page ends the drain and its
//! error is yielded once; nothing is fetched afterwards.

// crates.io
use futures::Stream;
// self
use crate::{
	_prelude::*,
	auth::CredentialHolder,
	config::HarvestConfig,
	error::MalformedError,
	model::{Category, Item, PageRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
	resilient::AutoRefresh,
	transport::ResourceTransport,
};

/// Produces [`Drain`]s over a shared transport and credential holder.
#[derive(Clone)]
pub struct Paginator {
	transport: Arc<dyn ResourceTransport>,
	holder: Arc<CredentialHolder>,
	page_size: u32,
	pacing: std::time::Duration,
}
impl Paginator {
	const DEFAULT_PACING: std::time::Duration = std::time::Duration::from_secs(1);
	const DEFAULT_PAGE_SIZE: u32 = 100;

	/// Creates a paginator with a 100-item page size and a one-second pacing delay.
	pub fn new(transport: Arc<dyn ResourceTransport>, holder: Arc<CredentialHolder>) -> Self {
		Self {
			transport,
			holder,
			page_size: Self::DEFAULT_PAGE_SIZE,
			pacing: Self::DEFAULT_PACING,
		}
	}

	/// Creates a paginator using the page size and pacing from [`HarvestConfig`].
	pub fn from_config(
		transport: Arc<dyn ResourceTransport>,
		holder: Arc<CredentialHolder>,
		config: &HarvestConfig,
	) -> Self {
		Self::new(transport, holder).with_page_size(config.page_size).with_pacing(config.pacing())
	}

	/// Overrides the requested page size (clamped per endpoint at request time).
	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size;

		self
	}

	/// Overrides the delay inserted before every page after the first.
	pub fn with_pacing(mut self, pacing: std::time::Duration) -> Self {
		self.pacing = pacing;

		self
	}

	/// Credential holder shared by every drain.
	pub fn holder(&self) -> &CredentialHolder {
		&self.holder
	}

	/// Starts a drain of `category` for `resource_id`.
	///
	/// `resource_id` is the post identifier for likes/retweets and the conversation
	/// identifier for replies. No remote call happens until the drain is polled.
	pub fn drain(&self, category: Category, resource_id: impl Into<String>) -> Drain<'_> {
		Drain {
			paginator: self,
			category,
			resource_id: resource_id.into(),
			cursor: None,
			followed: HashSet::new(),
			buffer: VecDeque::new(),
			directory: HashMap::new(),
			refresh: AutoRefresh::new(&self.holder),
			pages: 0,
			finished: false,
			span: OpSpan::new(OpKind::Drain, category.as_str()),
		}
	}
}
impl Debug for Paginator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Paginator")
			.field("page_size", &self.page_size)
			.field("pacing", &self.pacing)
			.finish_non_exhaustive()
	}
}

/// Finite, non-restartable sequence of items from one category.
///
/// Reply items are resolved against the user expansions returned with their page; the
/// id → username directory accumulates for the lifetime of the drain.
pub struct Drain<'a> {
	paginator: &'a Paginator,
	category: Category,
	resource_id: String,
	cursor: Option<String>,
	followed: HashSet<String>,
	buffer: VecDeque<Item>,
	directory: HashMap<String, String>,
	refresh: AutoRefresh<'a>,
	pages: u32,
	finished: bool,
	span: OpSpan,
}
impl<'a> Drain<'a> {
	/// Category being drained.
	pub fn category(&self) -> Category {
		self.category
	}

	/// Number of page calls that completed successfully so far.
	pub fn pages_fetched(&self) -> u32 {
		self.pages
	}

	/// Yields the next item, fetching the next page when the buffer runs dry.
	///
	/// Returns `None` once the last page (no cursor) is consumed, and after an error has
	/// been yielded.
	pub async fn next(&mut self) -> Option<Result<Item>> {
		loop {
			if let Some(item) = self.buffer.pop_front() {
				return Some(Ok(item));
			}
			if self.finished {
				return None;
			}
			if let Err(err) = self.fetch_page().await {
				self.finished = true;
				self.buffer.clear();

				return Some(Err(err));
			}
		}
	}

	/// Drains every page into a vector, failing on the first failing page.
	pub async fn collect(mut self) -> Result<Vec<Item>> {
		const KIND: OpKind = OpKind::Drain;

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let span = self.span.clone();
		let result = span
			.instrument(async {
				let mut items = Vec::new();

				while let Some(item) = self.next().await {
					items.push(item?);
				}

				Ok::<_, Error>(items)
			})
			.await;

		match &result {
			Ok(items) => {
				obs::record_items(self.category.as_str(), items.len());
				obs::record_op_outcome(KIND, OpOutcome::Success);
			},
			Err(err) => {
				self.span.warn(format_args!("drain aborted after {} pages: {err}", self.pages));
				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	/// Converts the drain into a [`Stream`] of items.
	pub fn into_stream(self) -> impl Stream<Item = Result<Item>> + 'a {
		futures::stream::unfold(self, |mut drain| async move {
			drain.next().await.map(|item| (item, drain))
		})
	}

	async fn fetch_page(&mut self) -> Result<()> {
		let paginator = self.paginator;

		if self.pages > 0 && !paginator.pacing.is_zero() {
			tokio::time::sleep(paginator.pacing).await;
		}

		let category = self.category;
		let request = PageRequest {
			resource_id: self.resource_id.clone(),
			cursor: self.cursor.clone(),
			page_size: category.clamp_page_size(paginator.page_size),
		};
		let request = &request;
		let page = self
			.refresh
			.run(|credential| async move {
				paginator.transport.fetch_page(category, request, &credential.access_token).await
			})
			.await?;

		self.pages += 1;

		// Any cursor already followed means the remote cycles and would never run dry.
		if let Some(next) = page.next_cursor.as_ref().filter(|next| self.followed.contains(*next)) {
			return Err(MalformedError::CursorStalled { cursor: next.clone() }.into());
		}

		self.span.note(format_args!(
			"page {} returned {} items, more: {}",
			self.pages,
			page.items.len(),
			page.next_cursor.is_some()
		));

		for user in page.users {
			self.directory.insert(user.id, user.username);
		}
		for mut item in page.items {
			if item.username.is_none() {
				item.username = self.directory.get(&item.user_id).cloned();
			}

			self.buffer.push_back(item);
		}

		match page.next_cursor {
			Some(cursor) => {
				self.followed.insert(cursor.clone());
				self.cursor = Some(cursor);
			},
			None => self.finished = true,
		}

		Ok(())
	}
}
impl Debug for Drain<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Drain")
			.field("category", &self.category)
			.field("resource_id", &self.resource_id)
			.field("pages", &self.pages)
			.field("buffered", &self.buffer.len())
			.field("finished", &self.finished)
			.finish()
	}
}
