//! `(from, to)` → converter lookup.

use std::collections::BTreeMap;

use super::codecs::{CaCodec, MviEncoder, VocCodec, WatsonCodec};
use super::pipeline::Pipeline;
use super::{Conversion, ConvertOptions, Decoder, Encoder, Format, FromOptions};
use crate::error::AnnoconvError;

/// Builds a conversion from run options.
pub type ConverterFactory = fn(&ConvertOptions) -> Result<Box<dyn Conversion>, AnnoconvError>;

/// Maps each supported format pair to its converter.
///
/// Adding a format means registering its pairs; nothing else branches on
/// the format.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<(Format, Format), ConverterFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in pairing. MVI is export-only.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();

        registry.register(Format::Watson, Format::Voc, pipeline::<WatsonCodec, VocCodec>);
        registry.register(Format::Watson, Format::Ca, pipeline::<WatsonCodec, CaCodec>);
        registry.register(Format::Watson, Format::Mvi, pipeline::<WatsonCodec, MviEncoder>);

        registry.register(Format::Voc, Format::Watson, pipeline::<VocCodec, WatsonCodec>);
        registry.register(Format::Voc, Format::Ca, pipeline::<VocCodec, CaCodec>);
        registry.register(Format::Voc, Format::Mvi, pipeline::<VocCodec, MviEncoder>);

        registry.register(Format::Ca, Format::Watson, pipeline::<CaCodec, WatsonCodec>);
        registry.register(Format::Ca, Format::Voc, pipeline::<CaCodec, VocCodec>);
        registry.register(Format::Ca, Format::Mvi, pipeline::<CaCodec, MviEncoder>);

        registry
    }

    /// Registers (or replaces) the converter for `from -> to`.
    pub fn register(&mut self, from: Format, to: Format, factory: ConverterFactory) {
        self.factories.insert((from, to), factory);
    }

    /// Returns true if `from -> to` is registered.
    pub fn supports(&self, from: Format, to: Format) -> bool {
        self.factories.contains_key(&(from, to))
    }

    /// Validates `options` and builds the matching conversion.
    pub fn build(&self, options: &ConvertOptions) -> Result<Box<dyn Conversion>, AnnoconvError> {
        if options.from == options.to {
            return Err(AnnoconvError::SameFormat(options.from.name().to_string()));
        }

        let factory = self
            .factories
            .get(&(options.from, options.to))
            .ok_or_else(|| AnnoconvError::UnsupportedConversion {
                from: options.from.name().to_string(),
                to: options.to.name().to_string(),
            })?;

        factory(options)
    }
}

fn pipeline<D, E>(options: &ConvertOptions) -> Result<Box<dyn Conversion>, AnnoconvError>
where
    D: Decoder + FromOptions + 'static,
    E: Encoder + FromOptions + 'static,
{
    Ok(Box::new(Pipeline::new(
        D::from_options(options)?,
        E::from_options(options)?,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn options(from: Format, to: Format) -> ConvertOptions {
        ConvertOptions::new(from, to, "in", "out")
    }

    #[test]
    fn every_distinct_readable_pair_is_registered() {
        let registry = Registry::with_builtin();
        for from in [Format::Watson, Format::Voc, Format::Ca] {
            for to in [Format::Watson, Format::Voc, Format::Ca, Format::Mvi] {
                assert_eq!(registry.supports(from, to), from != to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn same_format_is_a_config_error() {
        let err = Registry::with_builtin()
            .build(&options(Format::Voc, Format::Voc))
            .err()
            .expect("same format must fail");
        assert!(matches!(err, AnnoconvError::SameFormat(_)));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn mvi_cannot_be_a_source() {
        let err = Registry::with_builtin()
            .build(&options(Format::Mvi, Format::Voc))
            .err()
            .expect("mvi source must fail");
        assert!(matches!(err, AnnoconvError::UnsupportedConversion { .. }));
    }

    #[test]
    fn mvi_requires_a_dataset_name() {
        let registry = Registry::with_builtin();
        let err = registry
            .build(&options(Format::Watson, Format::Mvi))
            .err()
            .expect("missing dataset must fail");
        assert!(matches!(err, AnnoconvError::MissingDatasetName(_)));

        let blank = options(Format::Watson, Format::Mvi).with_dataset("   ");
        assert!(registry.build(&blank).is_err());

        let named = options(Format::Watson, Format::Mvi).with_dataset("birds");
        assert!(registry.build(&named).is_ok());
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let err = Registry::new()
            .build(&options(Format::Watson, Format::Voc))
            .err()
            .expect("nothing registered");
        assert!(err.to_string().contains("watson"));
    }
}
