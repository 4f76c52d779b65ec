//! Constructors and factory methods: selection policies and invocation.

use std::fmt;
use std::rc::Rc;

use crate::builder::SpecimenBuilder;
use crate::context::SpecimenContext;
use crate::error::Result;
use crate::reflect::{CollectionKind, ModelCache, Parameter, TypeKey, TypeModel};
use crate::request::Request;
use crate::value::{Specimen, Value};

/// A constructor or factory method described by its parameters
pub trait Method {
    /// Method name, `new` for plain constructors
    fn name(&self) -> &'static str;

    /// Type declaring the method
    fn declaring_type(&self) -> TypeKey;

    /// Parameters in positional order
    fn parameters(&self) -> &[Parameter];

    /// Call the method with one resolved value per parameter
    fn invoke(&self, arguments: Vec<Value>) -> Result<Value>;
}

type MethodBody = Box<dyn Fn(Vec<Value>) -> Result<Value>>;

/// A method backed by a closure
pub struct DelegatingMethod {
    declaring: TypeKey,
    name: &'static str,
    parameters: Vec<Parameter>,
    body: MethodBody,
}

impl DelegatingMethod {
    /// Create a method from its signature and body
    pub fn new(
        declaring: TypeKey,
        name: &'static str,
        parameters: Vec<Parameter>,
        body: impl Fn(Vec<Value>) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            declaring,
            name,
            parameters,
            body: Box::new(body),
        }
    }
}

impl Method for DelegatingMethod {
    fn name(&self) -> &'static str {
        self.name
    }

    fn declaring_type(&self) -> TypeKey {
        self.declaring
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn invoke(&self, arguments: Vec<Value>) -> Result<Value> {
        (self.body)(arguments)
    }
}

impl fmt::Debug for DelegatingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingMethod")
            .field("declaring", &self.declaring)
            .field("name", &self.name)
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

/// Selects and orders the candidate methods of a type
pub trait MethodQuery {
    /// Candidate methods, most preferred first
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>>;
}

impl<Q: MethodQuery + ?Sized> MethodQuery for Box<Q> {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        (**self).select_methods(model, models)
    }
}

impl<Q: MethodQuery + ?Sized> MethodQuery for Rc<Q> {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        (**self).select_methods(model, models)
    }
}

/// Constructors by ascending parameter count
#[derive(Debug, Clone, Copy, Default)]
pub struct ModestConstructorQuery;

impl MethodQuery for ModestConstructorQuery {
    fn select_methods(&self, model: &TypeModel, _models: &ModelCache) -> Vec<Rc<dyn Method>> {
        let mut methods = model.constructors().to_vec();
        methods.sort_by_key(|method| method.parameters().len());
        methods
    }
}

/// Constructors by descending parameter count
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyConstructorQuery;

impl MethodQuery for GreedyConstructorQuery {
    fn select_methods(&self, model: &TypeModel, _models: &ModelCache) -> Vec<Rc<dyn Method>> {
        let mut methods = model.constructors().to_vec();
        methods.sort_by_key(|method| std::cmp::Reverse(method.parameters().len()));
        methods
    }
}

/// Static factory methods in declaration order
#[derive(Debug, Clone, Copy, Default)]
pub struct FactoryMethodQuery;

impl MethodQuery for FactoryMethodQuery {
    fn select_methods(&self, model: &TypeModel, _models: &ModelCache) -> Vec<Rc<dyn Method>> {
        model.factories().to_vec()
    }
}

/// The candidates of several queries, concatenated in order
#[derive(Default)]
pub struct CompositeMethodQuery {
    queries: Vec<Box<dyn MethodQuery>>,
}

impl CompositeMethodQuery {
    /// Combine queries
    pub fn new(queries: Vec<Box<dyn MethodQuery>>) -> Self {
        Self { queries }
    }

    /// Append a query
    pub fn then<Q: MethodQuery + 'static>(mut self, query: Q) -> Self {
        self.queries.push(Box::new(query));
        self
    }
}

impl MethodQuery for CompositeMethodQuery {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        self.queries
            .iter()
            .flat_map(|query| query.select_methods(model, models))
            .collect()
    }
}

/// Modest constructors first, then factory methods
pub fn default_query() -> CompositeMethodQuery {
    CompositeMethodQuery::default()
        .then(ModestConstructorQuery)
        .then(FactoryMethodQuery)
}

/// Orders constructors by how many of their parameters are favored
/// collections, then by ascending parameter count
fn favoring(
    model: &TypeModel,
    models: &ModelCache,
    favored: impl Fn(CollectionKind) -> bool,
) -> Vec<Rc<dyn Method>> {
    let score = |method: &Rc<dyn Method>| {
        method
            .parameters()
            .iter()
            .filter(|parameter| {
                models
                    .model(&parameter.ty)
                    .collection()
                    .is_some_and(|shape| favored(shape.kind()))
            })
            .count()
    };

    let mut methods: Vec<_> = model
        .constructors()
        .iter()
        .map(|method| (score(method), Rc::clone(method)))
        .collect();
    methods.sort_by_key(|(score, method)| (std::cmp::Reverse(*score), method.parameters().len()));
    methods.into_iter().map(|(_, method)| method).collect()
}

/// Prefers constructors taking any collection
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerableFavoringConstructorQuery;

impl MethodQuery for EnumerableFavoringConstructorQuery {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        favoring(model, models, |_| true)
    }
}

/// Prefers constructors taking fixed-size arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayFavoringConstructorQuery;

impl MethodQuery for ArrayFavoringConstructorQuery {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        favoring(model, models, |kind| matches!(kind, CollectionKind::Array(_)))
    }
}

/// Prefers constructors taking lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFavoringConstructorQuery;

impl MethodQuery for ListFavoringConstructorQuery {
    fn select_methods(&self, model: &TypeModel, models: &ModelCache) -> Vec<Rc<dyn Method>> {
        favoring(model, models, |kind| kind == CollectionKind::List)
    }
}

/// Builds instances by invoking the first method whose parameters all resolve
pub struct MethodInvoker {
    query: Box<dyn MethodQuery>,
}

impl MethodInvoker {
    /// Create an invoker using `query` to order candidates
    pub fn new<Q: MethodQuery + 'static>(query: Q) -> Self {
        Self {
            query: Box::new(query),
        }
    }

    fn resolve_arguments(
        method: &dyn Method,
        context: &SpecimenContext<'_>,
    ) -> Result<Option<Vec<Value>>> {
        let mut arguments = Vec::with_capacity(method.parameters().len());
        for parameter in method.parameters() {
            match context.resolve(&Request::Parameter(*parameter))? {
                Specimen::Value(value) => arguments.push(value),
                Specimen::NoSpecimen | Specimen::Omit => return Ok(None),
            }
        }
        Ok(Some(arguments))
    }
}

impl Default for MethodInvoker {
    fn default() -> Self {
        Self::new(default_query())
    }
}

impl SpecimenBuilder for MethodInvoker {
    fn create(&self, request: &Request, context: &SpecimenContext<'_>) -> Result<Specimen> {
        let Request::Type(ty) = request else {
            return Ok(Specimen::NoSpecimen);
        };

        let model = context.model(ty);
        for method in self.query.select_methods(&model, context.models()) {
            if let Some(arguments) = Self::resolve_arguments(method.as_ref(), context)? {
                return method.invoke(arguments).map(Specimen::Value);
            }
        }
        Ok(Specimen::NoSpecimen)
    }
}
