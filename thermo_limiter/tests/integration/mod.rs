mod query;
mod scenarios;
mod startup;
