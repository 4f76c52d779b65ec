//! Erased type models and the typed builder that fills them.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{BoxError, FixtureError, Result};
use crate::method::{DelegatingMethod, Method};
use crate::reflect::{ParameterList, Reflect, TypeKey};
use crate::request::Request;
use crate::value::Value;

/// A constructor or factory method parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Type declaring the method
    pub declaring: TypeKey,
    /// Name of the method the parameter belongs to
    pub method: &'static str,
    /// Parameter name
    pub name: &'static str,
    /// Zero-based position
    pub position: usize,
    /// Parameter type
    pub ty: TypeKey,
}

/// Whether a member behaves like a property (validating setter) or a plain field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Field,
}

/// Identity of a writable member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberInfo {
    /// Type declaring the member
    pub declaring: TypeKey,
    /// Member name
    pub name: &'static str,
    /// Member type
    pub ty: TypeKey,
    /// Property or field
    pub kind: MemberKind,
}

impl MemberInfo {
    /// The request used to resolve a value for this member
    pub fn request(&self) -> Request {
        match self.kind {
            MemberKind::Property => Request::Property(*self),
            MemberKind::Field => Request::Field(*self),
        }
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MemberKind::Property => "property",
            MemberKind::Field => "field",
        };
        write!(f, "{} {}.{}: {}", kind, self.declaring, self.name, self.ty)
    }
}

type Setter = Rc<dyn Fn(&mut Value, Value) -> Result<()>>;

/// A writable member together with its setter
#[derive(Clone)]
pub struct Member {
    info: MemberInfo,
    auto_populate: bool,
    setter: Setter,
}

impl Member {
    /// Identity of the member
    pub fn info(&self) -> &MemberInfo {
        &self.info
    }

    /// Member name
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Whether auto-population assigns this member
    pub fn auto_populate(&self) -> bool {
        self.auto_populate
    }

    /// The request used to resolve a value for this member
    pub fn request(&self) -> Request {
        self.info.request()
    }

    /// Assign a value to the member of `target`
    pub fn assign(&self, target: &mut Value, value: Value) -> Result<()> {
        (self.setter)(target, value)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("info", &self.info)
            .field("auto_populate", &self.auto_populate)
            .finish()
    }
}

/// A declared conversion from a type to one of its interfaces or base types
#[derive(Clone)]
pub struct Conversion {
    target: TypeKey,
    convert: Rc<dyn Fn(Value) -> Result<Value>>,
}

impl Conversion {
    /// Type produced by the conversion
    pub fn target(&self) -> TypeKey {
        self.target
    }

    /// Convert a value
    pub fn apply(&self, value: Value) -> Result<Value> {
        (self.convert)(value)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("target", &self.target)
            .finish()
    }
}

/// The flavour of a collection type, used by the collection-favoring queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Array(usize),
    Set,
    Map,
    Deque,
}

/// How a collection type is assembled from its elements
#[derive(Clone)]
pub struct CollectionShape {
    element: TypeKey,
    kind: CollectionKind,
    assemble: Rc<dyn Fn(Vec<Value>) -> Result<Value>>,
}

impl CollectionShape {
    /// Element type
    pub fn element(&self) -> TypeKey {
        self.element
    }

    /// Collection flavour
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Exact element count required by the collection, if any
    pub fn fixed_len(&self) -> Option<usize> {
        match self.kind {
            CollectionKind::Array(len) => Some(len),
            _ => None,
        }
    }

    /// Build the collection from element values
    pub fn assemble(&self, elements: Vec<Value>) -> Result<Value> {
        (self.assemble)(elements)
    }
}

impl fmt::Debug for CollectionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionShape")
            .field("element", &self.element)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Everything the engine knows about one type
pub struct TypeModel {
    key: TypeKey,
    constructors: Vec<Rc<dyn Method>>,
    factories: Vec<Rc<dyn Method>>,
    members: Vec<Member>,
    variants: Vec<Rc<dyn Fn() -> Value>>,
    collection: Option<CollectionShape>,
    interfaces: Vec<Conversion>,
    base_types: Vec<Conversion>,
}

impl TypeModel {
    /// The described type
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Constructors in declaration order
    pub fn constructors(&self) -> &[Rc<dyn Method>] {
        &self.constructors
    }

    /// Factory methods in declaration order
    pub fn factories(&self) -> &[Rc<dyn Method>] {
        &self.factories
    }

    /// Writable members in declaration order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by name
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Number of enum variants
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Produce the variant at `index`
    pub fn variant(&self, index: usize) -> Option<Value> {
        self.variants.get(index).map(|make| make())
    }

    /// Collection shape, if this is a collection type
    pub fn collection(&self) -> Option<&CollectionShape> {
        self.collection.as_ref()
    }

    /// Declared interface conversions
    pub fn interfaces(&self) -> &[Conversion] {
        &self.interfaces
    }

    /// Declared base type conversions
    pub fn base_types(&self) -> &[Conversion] {
        &self.base_types
    }

    /// Find a conversion (interface or base type) producing `target`
    pub fn conversion_to(&self, target: &TypeKey) -> Option<&Conversion> {
        self.interfaces
            .iter()
            .chain(self.base_types.iter())
            .find(|conversion| conversion.target() == *target)
    }

    /// Whether nothing in the model can produce an instance
    pub fn is_abstract(&self) -> bool {
        self.constructors.is_empty()
            && self.factories.is_empty()
            && self.variants.is_empty()
            && self.collection.is_none()
    }
}

impl fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeModel")
            .field("key", &self.key)
            .field("constructors", &self.constructors.len())
            .field("factories", &self.factories.len())
            .field("members", &self.members)
            .field("variants", &self.variants.len())
            .field("collection", &self.collection)
            .finish()
    }
}

/// Typed registration API used inside [`Reflect::reflect`]
pub struct ModelBuilder<T> {
    model: TypeModel,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> ModelBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            model: TypeModel {
                key: TypeKey::of::<T>(),
                constructors: Vec::new(),
                factories: Vec::new(),
                members: Vec::new(),
                variants: Vec::new(),
                collection: None,
                interfaces: Vec::new(),
                base_types: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub(crate) fn finish(self) -> TypeModel {
        self.model
    }

    /// The key of the described type
    pub fn key(&self) -> TypeKey {
        self.model.key
    }

    /// Register a constructor
    ///
    /// # Panics
    ///
    /// Panics if the number of names differs from the number of arguments.
    pub fn constructor<A, F>(&mut self, names: &[&'static str], constructor: F) -> &mut Self
    where
        A: ParameterList,
        F: Fn(A) -> T + 'static,
    {
        let method = self.method::<A>("new", names, move |args| Ok(constructor(args)));
        self.model.constructors.push(method);
        self
    }

    /// Register a constructor that may reject its arguments
    ///
    /// # Panics
    ///
    /// Panics if the number of names differs from the number of arguments.
    pub fn try_constructor<A, E, F>(&mut self, names: &[&'static str], constructor: F) -> &mut Self
    where
        A: ParameterList,
        E: Into<BoxError>,
        F: Fn(A) -> std::result::Result<T, E> + 'static,
    {
        let type_name = self.model.key.short_name();
        let method = self.method::<A>("try_new", names, move |args| {
            constructor(args).map_err(|error| FixtureError::invocation("try_new", &type_name, error))
        });
        self.model.constructors.push(method);
        self
    }

    /// Register a static factory method, tried after every constructor
    ///
    /// # Panics
    ///
    /// Panics if the number of names differs from the number of arguments.
    pub fn factory<A, F>(&mut self, name: &'static str, names: &[&'static str], factory: F) -> &mut Self
    where
        A: ParameterList,
        F: Fn(A) -> T + 'static,
    {
        let method = self.method::<A>(name, names, move |args| Ok(factory(args)));
        self.model.factories.push(method);
        self
    }

    fn method<A: ParameterList>(
        &self,
        name: &'static str,
        names: &[&'static str],
        body: impl Fn(A) -> Result<T> + 'static,
    ) -> Rc<dyn Method> {
        let declaring = self.model.key;
        let types = A::types();
        if names.len() != types.len() {
            panic!(
                "{}::{} declares {} parameter names for {} arguments",
                declaring,
                name,
                names.len(),
                types.len()
            );
        }

        let parameters = names
            .iter()
            .zip(types)
            .enumerate()
            .map(|(position, (param_name, ty))| Parameter {
                declaring,
                method: name,
                name: param_name,
                position,
                ty,
            })
            .collect();

        Rc::new(DelegatingMethod::new(
            declaring,
            name,
            parameters,
            move |values| {
                let args = A::from_values(values)?;
                body(args).map(Value::new)
            },
        ))
    }

    /// Register a member with a validating setter, assigned by auto-population
    pub fn property<V, E, F>(&mut self, name: &'static str, setter: F) -> &mut Self
    where
        V: Reflect,
        E: Into<BoxError>,
        F: Fn(&mut T, V) -> std::result::Result<(), E> + 'static,
    {
        self.push_member::<V, E, F>(name, MemberKind::Property, true, setter)
    }

    /// Register a plain field, assigned by auto-population
    pub fn field<V, F>(&mut self, name: &'static str, setter: F) -> &mut Self
    where
        V: Reflect,
        F: Fn(&mut T, V) + 'static,
    {
        self.push_member::<V, BoxError, _>(name, MemberKind::Field, true, move |target, value| {
            setter(target, value);
            Ok(())
        })
    }

    /// Register a field the constructor already fills
    ///
    /// The field can still be overridden through a composer but is skipped by
    /// auto-population.
    pub fn bound_field<V, F>(&mut self, name: &'static str, setter: F) -> &mut Self
    where
        V: Reflect,
        F: Fn(&mut T, V) + 'static,
    {
        self.push_member::<V, BoxError, _>(name, MemberKind::Field, false, move |target, value| {
            setter(target, value);
            Ok(())
        })
    }

    fn push_member<V, E, F>(
        &mut self,
        name: &'static str,
        kind: MemberKind,
        auto_populate: bool,
        setter: F,
    ) -> &mut Self
    where
        V: Reflect,
        E: Into<BoxError>,
        F: Fn(&mut T, V) -> std::result::Result<(), E> + 'static,
    {
        if self.model.member(name).is_some() {
            panic!("{} declares member `{}` twice", self.model.key, name);
        }

        let info = MemberInfo {
            declaring: self.model.key,
            name,
            ty: TypeKey::of::<V>(),
            kind,
        };
        let setter: Setter = Rc::new(move |target: &mut Value, value: Value| {
            let actual = target.type_name();
            let target = target.downcast_mut::<T>().ok_or_else(|| {
                FixtureError::type_mismatch(std::any::type_name::<T>(), actual)
            })?;
            let value = value.into_typed::<V>()?;
            setter(target, value).map_err(|error| FixtureError::member_assignment(info.to_string(), error))
        });

        self.model.members.push(Member {
            info,
            auto_populate,
            setter,
        });
        self
    }

    /// Register an enum variant; variants are produced in registration order
    pub fn variant<F>(&mut self, make: F) -> &mut Self
    where
        F: Fn() -> T + 'static,
    {
        self.model.variants.push(Rc::new(move || Value::new(make())));
        self
    }

    /// Declare this type a collection of `E`
    pub fn collection<E, F>(&mut self, kind: CollectionKind, assemble: F) -> &mut Self
    where
        E: Reflect,
        F: Fn(Vec<E>) -> T + 'static,
    {
        self.try_collection::<E, _>(kind, move |elements| Ok(assemble(elements)))
    }

    /// Declare this type a collection of `E` whose assembly may fail
    pub fn try_collection<E, F>(&mut self, kind: CollectionKind, assemble: F) -> &mut Self
    where
        E: Reflect,
        F: Fn(Vec<E>) -> Result<T> + 'static,
    {
        self.model.collection = Some(CollectionShape {
            element: TypeKey::of::<E>(),
            kind,
            assemble: Rc::new(move |values: Vec<Value>| {
                let elements = values
                    .into_iter()
                    .map(Value::into_typed::<E>)
                    .collect::<Result<Vec<_>>>()?;
                assemble(elements).map(Value::new)
            }),
        });
        self
    }

    /// Declare that this type can stand in for the interface `U`
    pub fn implements<U, F>(&mut self, convert: F) -> &mut Self
    where
        U: Reflect,
        F: Fn(T) -> U + 'static,
    {
        let conversion = Self::conversion(convert);
        self.model.interfaces.push(conversion);
        self
    }

    /// Declare that this type can stand in for its base type `U`
    pub fn base_type<U, F>(&mut self, convert: F) -> &mut Self
    where
        U: Reflect,
        F: Fn(T) -> U + 'static,
    {
        let conversion = Self::conversion(convert);
        self.model.base_types.push(conversion);
        self
    }

    fn conversion<U, F>(convert: F) -> Conversion
    where
        U: Reflect,
        F: Fn(T) -> U + 'static,
    {
        Conversion {
            target: TypeKey::of::<U>(),
            convert: Rc::new(move |value: Value| {
                let value = value.into_typed::<T>()?;
                Ok(Value::new(convert(value)))
            }),
        }
    }
}
