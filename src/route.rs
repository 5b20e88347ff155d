//! Pure route classification for intercepted requests.

// self
use crate::{_prelude::*, error::ConfigError};

/// Classification assigned to an intercepted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
	/// Login-style entry point whose response carries fresh credentials.
	AuthEntry,
	/// Backend route requiring a bearer access token.
	Protected,
	/// Protected path whose method self-authenticates (uploads); never mutated.
	UploadExempt,
	/// Everything else: other origins, static assets, unclassifiable URLs.
	Passthrough,
}

/// Fixed route configuration the classifier evaluates against.
///
/// Defaults mirror the image gallery backend: auth entry at `/login` and `/register`,
/// protected prefixes `/images`, `/logout`, and `/user`, uploads exempt at the `/images`
/// collection root, the `/user` probe whose 401 means "not logged in", and the refresh
/// exchange at `/refresh`.
#[derive(Clone, Debug)]
pub struct RoutePolicy {
	origin: Url,
	refresh_url: Url,
	auth_entry_paths: Vec<String>,
	protected_prefixes: Vec<String>,
	upload_exempt_paths: Vec<String>,
	logout_paths: Vec<String>,
	probe_paths: Vec<String>,
}
impl RoutePolicy {
	/// Returns a builder seeded with the backend origin and the default gallery routes.
	pub fn builder(origin: impl Into<String>) -> RoutePolicyBuilder {
		RoutePolicyBuilder::new(origin)
	}

	/// Builds the default policy for the provided backend origin.
	pub fn for_origin(origin: impl Into<String>) -> Result<Self, ConfigError> {
		Self::builder(origin).build()
	}

	/// Classifies a request by raw URL and method.
	///
	/// Total and pure: anything that cannot be placed unambiguously—including URLs that fail
	/// to parse—is [`RouteClass::Passthrough`]. Connectivity fails open; credential injection
	/// fails closed.
	pub fn classify(&self, method: &Method, url: &str) -> RouteClass {
		let Ok(url) = Url::parse(url) else { return RouteClass::Passthrough };

		if url.origin() != self.origin.origin() {
			return RouteClass::Passthrough;
		}

		let path = url.path();

		if self.auth_entry_paths.iter().any(|candidate| candidate == path) {
			return RouteClass::AuthEntry;
		}
		if *method == Method::POST
			&& self.upload_exempt_paths.iter().any(|candidate| candidate == path)
		{
			return RouteClass::UploadExempt;
		}
		if self.protected_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
			return RouteClass::Protected;
		}

		RouteClass::Passthrough
	}

	/// Returns `true` for paths whose 401 signals "not logged in" rather than "expired".
	pub fn is_probe(&self, path: &str) -> bool {
		self.probe_paths.iter().any(|candidate| candidate == path)
	}

	/// Returns `true` for the logout route that receives the refresh-token body rewrite.
	pub fn is_logout(&self, path: &str) -> bool {
		self.logout_paths.iter().any(|candidate| candidate == path)
	}

	/// Backend origin this policy protects.
	pub fn origin(&self) -> &Url {
		&self.origin
	}

	/// Absolute URL of the refresh exchange endpoint.
	pub fn refresh_url(&self) -> &Url {
		&self.refresh_url
	}
}

/// Builder for [`RoutePolicy`].
#[derive(Clone, Debug)]
pub struct RoutePolicyBuilder {
	origin: String,
	refresh_path: String,
	auth_entry_paths: Vec<String>,
	protected_prefixes: Vec<String>,
	upload_exempt_paths: Vec<String>,
	logout_paths: Vec<String>,
	probe_paths: Vec<String>,
}
impl RoutePolicyBuilder {
	fn new(origin: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			refresh_path: "/refresh".into(),
			auth_entry_paths: vec!["/login".into(), "/register".into()],
			protected_prefixes: vec!["/images".into(), "/logout".into(), "/user".into()],
			upload_exempt_paths: vec!["/images".into()],
			logout_paths: vec!["/logout".into()],
			probe_paths: vec!["/user".into()],
		}
	}

	/// Replaces the auth-entry path set.
	pub fn auth_entry_paths(
		mut self,
		paths: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		self.auth_entry_paths = paths.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the protected prefix set.
	pub fn protected_prefixes(
		mut self,
		prefixes: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		self.protected_prefixes = prefixes.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the upload-exempt path set (matched exactly, `POST` only).
	pub fn upload_exempt_paths(
		mut self,
		paths: impl IntoIterator<Item = impl Into<String>>,
	) -> Self {
		self.upload_exempt_paths = paths.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the logout path set.
	pub fn logout_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.logout_paths = paths.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the probe path set.
	pub fn probe_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.probe_paths = paths.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the refresh exchange path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Validates the configuration and produces a [`RoutePolicy`].
	pub fn build(self) -> Result<RoutePolicy, ConfigError> {
		let origin =
			Url::parse(&self.origin).map_err(|source| ConfigError::InvalidOrigin { source })?;

		for path in self
			.auth_entry_paths
			.iter()
			.chain(&self.protected_prefixes)
			.chain(&self.upload_exempt_paths)
			.chain(&self.logout_paths)
			.chain(&self.probe_paths)
			.chain(Some(&self.refresh_path))
		{
			if !path.starts_with('/') {
				return Err(ConfigError::RelativePath { path: path.clone() });
			}
		}

		let refresh_url = origin
			.join(&self.refresh_path)
			.map_err(|source| ConfigError::InvalidOrigin { source })?;

		Ok(RoutePolicy {
			origin,
			refresh_url,
			auth_entry_paths: self.auth_entry_paths,
			protected_prefixes: self.protected_prefixes,
			upload_exempt_paths: self.upload_exempt_paths,
			logout_paths: self.logout_paths,
			probe_paths: self.probe_paths,
		})
	}
}
