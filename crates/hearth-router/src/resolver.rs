use crate::{
    error::{Result, RouterError},
    hook::{compare_hooks, Hook},
};
use hearth_http::{Request, Response, Status};
use std::sync::{Arc, Mutex};

/// the result of trying a single hook's handler.
pub enum Outcome {
    /// the handler answered; the resolver stops and returns this.
    Response(Response),
    /// the handler declined to answer. carries the request back (possibly
    /// mutated) so a skippable hook can fall through to the next one.
    NotHandled(Request),
}

/// something a [`Resolver`] can dispatch a narrowed request to: either a
/// leaf handler or a nested resolver.
pub trait RouteHandler: Send + Sync {
    fn dispatch(&self, request: Request) -> Outcome;
}

impl<F> RouteHandler for F
where
    F: Fn(Request) -> Outcome + Send + Sync,
{
    fn dispatch(&self, request: Request) -> Outcome {
        self(request)
    }
}

impl<T: RouteHandler + ?Sized> RouteHandler for Arc<T> {
    fn dispatch(&self, request: Request) -> Outcome {
        (**self).dispatch(request)
    }
}

/// wraps an ordinary [`hearth_http::Handler`] (one that always answers) as
/// a non-skippable [`RouteHandler`]; handler errors become the response
/// their [`hearth_http::Error::status`] names.
struct Answering<H>(H);

impl<H: hearth_http::Handler> RouteHandler for Answering<H> {
    fn dispatch(&self, request: Request) -> Outcome {
        match self.0.handle(request) {
            Ok(response) => Outcome::Response(response),
            Err(e) => {
                let status = e.status().unwrap_or(Status::InternalServerError);
                log::error!("route handler error: {e}");
                Outcome::Response(
                    Response::new(status).with_content(format!("{status}")),
                )
            }
        }
    }
}

#[derive(Clone)]
struct UrlMapping {
    hook: Hook,
    handler: Arc<dyn RouteHandler>,
}

/// dispatches a request to the first matching [`Hook`], rewriting the url
/// so the matched handler sees only the domain/path suffix it owns.
///
/// mutations are serialized under a single lock; matching reads the list
/// under the same lock for the duration of one dispatch.
#[derive(Default)]
pub struct Resolver {
    mappings: Mutex<Vec<UrlMapping>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// register a single hook/handler pair.
    pub fn add(&self, hook: Hook, handler: impl RouteHandler + 'static) -> Result<()> {
        self.add_range([(hook, Arc::new(handler) as Arc<dyn RouteHandler>)])
    }

    /// register a hook paired with an ordinary answering handler; declining
    /// to answer is never valid here, so the hook should not be skippable.
    pub fn add_handler(&self, hook: Hook, handler: impl hearth_http::Handler + 'static) -> Result<()> {
        self.add(hook, Answering(handler))
    }

    /// register many hook/handler pairs in one pass, locking once.
    pub fn add_range(
        &self,
        entries: impl IntoIterator<Item = (Hook, Arc<dyn RouteHandler>)>,
    ) -> Result<()> {
        let mut incoming: Vec<UrlMapping> = entries
            .into_iter()
            .map(|(hook, handler)| UrlMapping { hook, handler })
            .collect();

        let mut mappings = self.mappings.lock().expect("resolver mutex poisoned");

        for i in 0..incoming.len() {
            if !incoming[i].hook.skippable {
                let collides_with_existing = mappings
                    .iter()
                    .any(|m| !m.hook.skippable && m.hook == incoming[i].hook);
                let collides_within_batch = incoming[..i]
                    .iter()
                    .any(|m| !m.hook.skippable && m.hook == incoming[i].hook);
                if collides_with_existing || collides_within_batch {
                    return Err(RouterError::DuplicateHook);
                }
            }
        }

        mappings.append(&mut incoming);
        mappings.sort_by(|a, b| compare_hooks(&a.hook, &b.hook));
        Ok(())
    }

    /// try each matching hook in order, returning the first response or
    /// [`Outcome::NotHandled`] if none of them answered.
    pub fn route(&self, request: Request) -> Outcome {
        // copy the candidate list out from under the lock so handler
        // dispatch below never runs while holding it: a handler routing
        // back through this same resolver would otherwise deadlock.
        let mappings: Vec<UrlMapping> = self
            .mappings
            .lock()
            .expect("resolver mutex poisoned")
            .clone();
        let original_url = request.url().clone();
        let mut request = request;

        for mapping in mappings.iter() {
            let Some(matched) = mapping.hook.matches(&original_url) else {
                continue;
            };
            let narrowed = original_url
                .with_domain_consumed(&matched.domain_consumed, matched.domain_remaining)
                .with_path_consumed(&matched.path_consumed, matched.path_remaining);
            request.set_url(narrowed);

            match mapping.handler.dispatch(request) {
                Outcome::Response(response) => return Outcome::Response(response),
                Outcome::NotHandled(returned) => {
                    if !mapping.hook.skippable {
                        log::error!("non-skippable hook matched but its handler did not answer");
                        return Outcome::Response(
                            Response::new(Status::InternalServerError)
                                .with_content("internal routing error"),
                        );
                    }
                    request = returned;
                }
            }
        }

        request.set_url(original_url);
        Outcome::NotHandled(request)
    }
}

impl RouteHandler for Resolver {
    fn dispatch(&self, request: Request) -> Outcome {
        self.route(request)
    }
}

/// lets a [`Resolver`] terminate a connection loop directly: anything left
/// unhandled becomes a 404 carrying the original url.
impl hearth_http::Handler for Resolver {
    fn handle(&self, request: Request) -> hearth_http::Result<Response> {
        let url = request.url().clone();
        match self.route(request) {
            Outcome::Response(response) => Ok(response),
            Outcome::NotHandled(_) => {
                Ok(Response::new(Status::NotFound).with_content(format!("no route matched {url}")))
            }
        }
    }
}
