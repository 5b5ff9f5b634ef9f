use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{
    Aggregate, Clock, Error, Form, Identifier, Result, Text, Timestamp, ValidationError, Value,
    ValueError,
};

/// Builds the aggregate a command is delivered to.
pub type Target = Arc<dyn Fn(&Command) -> Box<dyn Aggregate>>;

/// Name of the field holding the time a command was acknowledged.
const NOW_FIELD: &str = "now";

/// Default name of the field identifying the receiving aggregate.
const DEFAULT_ID_FIELD: &str = "id";

/// The schema of a command: its name, parameters and receiver.
///
/// # Example
///
/// ```
/// use ess::{CommandDefinition, Identifier, Text};
///
/// let sign_up = CommandDefinition::new("sign-up")
///     .id("username", Identifier::new())
///     .field("name", Text::trimmed());
///
/// let mut command = sign_up.new_command();
/// command.set("username", "jane").set("name", "  Jane Doe ");
///
/// assert!(command.errors().is_ok());
/// assert_eq!(command.aggregate_id(), "jane");
/// assert_eq!(command.get("name").unwrap().to_string(), "Jane Doe");
/// ```
#[derive(Clone)]
pub struct CommandDefinition {
    name: String,
    id_field: String,
    fields: BTreeMap<String, Box<dyn Value>>,
    target: Option<Target>,
}

impl CommandDefinition {
    /// A definition without parameters, identified by an [`Identifier`] in
    /// the field `"id"`.
    pub fn new(name: impl Into<String>) -> Self {
        let mut fields: BTreeMap<String, Box<dyn Value>> = BTreeMap::new();
        fields.insert(DEFAULT_ID_FIELD.to_string(), Box::new(Identifier::new()));

        CommandDefinition {
            name: name.into(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            fields,
            target: None,
        }
    }

    /// Name of the command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the parameter `name`, parsed by `value`.
    pub fn field(mut self, name: impl Into<String>, value: impl Value + 'static) -> Self {
        self.fields.insert(name.into(), Box::new(value));
        self
    }

    /// Registers the parameter `name` and designates it as the identifier of
    /// the receiving aggregate, replacing the default `"id"` field.
    pub fn id(mut self, name: impl Into<String>, value: impl Value + 'static) -> Self {
        let name = name.into();
        if self.id_field == DEFAULT_ID_FIELD && name != DEFAULT_ID_FIELD {
            self.fields.remove(DEFAULT_ID_FIELD);
        }
        self.fields.insert(name.clone(), Box::new(value));
        self.id_field = name;
        self
    }

    /// Registers the function building the receiving aggregate.
    pub fn target<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Command) -> Box<dyn Aggregate> + 'static,
    {
        self.target = Some(Arc::new(constructor));
        self
    }

    /// Instantiates the command with every field at its initial value.
    pub fn new_command(&self) -> Command {
        Command {
            name: self.name.clone(),
            id_field: self.id_field.clone(),
            fields: self.fields.clone(),
            errors: ValidationError::new(),
            receiver: None,
            target: self.target.clone(),
            executed: false,
        }
    }

    /// Instantiates the command and fills in its fields from `form`.
    pub fn from_form(&self, form: &dyn Form) -> Command {
        let mut command = self.new_command();
        command.fill(form);
        command
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("id_field", &self.id_field)
            .field("fields", &self.fields)
            .field("target", &self.target.is_some())
            .finish()
    }
}

/// A request for a state change, instantiated from a [`CommandDefinition`].
///
/// Text assigned to fields is parsed by each field's [`Value`]; parse errors
/// accumulate in [`errors`](Command::errors) and prevent the command from
/// reaching its receiver.
pub struct Command {
    name: String,
    id_field: String,
    fields: BTreeMap<String, Box<dyn Value>>,
    errors: ValidationError,
    receiver: Option<Box<dyn Aggregate>>,
    target: Option<Target>,
    executed: bool,
}

impl Command {
    /// Name of the command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of field `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Value> {
        self.fields.get(name).map(|value| &**value)
    }

    /// The value of field `name`, if it is a `T`.
    pub fn get_as<T: Value + 'static>(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_any().downcast_ref()
    }

    /// The id of the aggregate this command targets, or `""` if unset.
    pub fn aggregate_id(&self) -> String {
        self.get(&self.id_field)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    /// Whether the command has been delivered to its receiver.
    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Errors recorded while parsing field values.
    pub fn errors(&self) -> &ValidationError {
        &self.errors
    }

    /// Parses `text` into field `name`, recording any error.
    pub fn set(&mut self, name: &str, text: &str) -> &mut Self {
        match self.fields.get_mut(name) {
            Some(value) => {
                if let Err(err) = value.parse(text) {
                    self.errors.add(name, err.to_string());
                }
            }
            None => {
                self.errors.add(name, ValueError::UnknownField.to_string());
            }
        }
        self
    }

    /// Fills in every field from `form`. Every field is attempted, even after
    /// an earlier one failed to parse.
    pub fn fill(&mut self, form: &dyn Form) -> &mut Self {
        for (field, value) in self.fields.iter_mut() {
            if let Err(err) = value.parse(form.value_of(field)) {
                self.errors.add(field.as_str(), err.to_string());
            }
        }
        self
    }

    /// Delivers this command to `receiver` instead of building one from the
    /// definition's target.
    pub fn with_receiver(mut self, receiver: Box<dyn Aggregate>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Stamps the command with the current time of `clock` in the `"now"`
    /// field. An empty identifier is replaced by the Unix time in
    /// nanoseconds.
    pub fn acknowledge(&mut self, clock: &dyn Clock) {
        let now = clock.now();
        self.fields
            .insert(NOW_FIELD.to_string(), Box::new(Timestamp(now)));

        if self.aggregate_id().is_empty() {
            let id = now
                .timestamp_nanos_opt()
                .map_or_else(|| now.timestamp().to_string(), |nanos| nanos.to_string());
            self.fields
                .insert(self.id_field.clone(), Box::new(Text::verbatim(id)));
        }
    }

    /// The aggregate receiving this command.
    ///
    /// Built from the definition's target on first access and kept for the
    /// lifetime of the command.
    pub fn receiver(&mut self) -> Result<&mut (dyn Aggregate + 'static)> {
        if self.receiver.is_none() {
            let target = self
                .target
                .clone()
                .ok_or_else(|| Error::MissingTarget(self.name.clone()))?;
            self.receiver = Some((*target)(&*self));
        }

        self.receiver
            .as_deref_mut()
            .ok_or_else(|| Error::MissingTarget(self.name.clone()))
    }

    /// Delivers the command to its receiver.
    ///
    /// Fails with the recorded parse errors without involving the receiver,
    /// and fails if the command has been executed before.
    pub fn execute(&mut self) -> Result<()> {
        if !self.errors.is_ok() {
            return Err(self.errors.clone().into());
        }
        if self.executed {
            return Err(Error::AlreadyExecuted(self.name.clone()));
        }

        self.receiver()?;
        let Some(mut receiver) = self.receiver.take() else {
            return Err(Error::MissingTarget(self.name.clone()));
        };
        self.executed = true;
        let result = receiver.handle_command(self);
        self.receiver = Some(receiver);

        result
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (name, value) in &self.fields {
            write!(f, " {name}={:?}", value.to_string())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("id_field", &self.id_field)
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}
